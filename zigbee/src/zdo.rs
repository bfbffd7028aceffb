//zigbee device object management commands, profile 0x0000
//the aps cluster id doubles as the zdo command type; responses carry bit 15

use deku::{ self, prelude::* };
use serde::{ Serialize, Deserialize };

pub const IEEE_ADDRESS_REQUEST: u16 = 0x0001;
pub const NODE_DESCRIPTOR_REQUEST: u16 = 0x0002;
pub const DEVICE_ANNOUNCE: u16 = 0x0013;
pub const MANAGEMENT_LQI_REQUEST: u16 = 0x0031;
pub const MANAGEMENT_LEAVE_REQUEST: u16 = 0x0034;
pub const MANAGEMENT_PERMIT_JOINING_REQUEST: u16 = 0x0036;

pub const RESPONSE_FLAG: u16 = 0x8000;

#[derive(Debug)]
pub enum Error {
	Deku(deku::DekuError),
	UnknownCluster(u16),
	BufferTooSmall
}

impl core::fmt::Display for Error {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Deku(e) => e.fmt(f),
			Self::UnknownCluster(cluster_id) => write!(f, "Unknown zdo cluster {:#06x}", cluster_id),
			Self::BufferTooSmall => write!(f, "Buffer too small")
		}
	}
}

impl From<deku::DekuError> for Error {
	fn from(e: deku::DekuError) -> Self {
		Error::Deku(e)
	}
}

//mac capability byte carried in a device announce
#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct DeviceCapability {
	#[deku(bits = 1)]
	pub allocate_address: bool,
	#[deku(bits = 1)]
	pub security_capability: bool,
	#[deku(bits = 1, pad_bits_before = "2")]
	pub receiver_on_when_idle: bool,
	#[deku(bits = 1)]
	pub mains_powered: bool,
	#[deku(bits = 1)]
	pub full_function_device: bool,
	#[deku(bits = 1)]
	pub alternate_pan_coordinator: bool
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct IeeeAddressRequest {
	pub nwk_addr_of_interest: u16,
	pub request_type: u8,
	pub start_index: u8
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct IeeeAddressResponse {
	pub status: u8,
	pub ieee_addr: u64,
	pub nwk_addr: u16,
	//associated device list, present on extended responses only
	#[deku(read_all)]
	pub associated: Vec<u8>
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct NodeDescriptorRequest {
	pub nwk_addr_of_interest: u16
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct NodeDescriptorResponse {
	pub status: u8,
	pub nwk_addr: u16,
	#[deku(read_all)]
	pub descriptor: Vec<u8>
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct DeviceAnnounce {
	pub nwk_addr: u16,
	pub ieee_addr: u64,
	pub capability: DeviceCapability
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ManagementLqiRequest {
	pub start_index: u8
}

#[derive(Debug, DekuRead, DekuWrite, Serialize, Deserialize, Clone, PartialEq)]
pub struct NeighborTableEntry {
	pub extended_pan_id: u64,
	pub extended_address: u64,
	pub network_address: u16,
	//device type, rx on when idle and relationship bits
	pub properties: u8,
	pub permit_joining: u8,
	pub depth: u8,
	pub lqi: u8
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ManagementLqiResponse {
	pub status: u8,
	pub neighbor_table_entries: u8,
	pub start_index: u8,
	pub neighbor_table_list_count: u8,
	#[deku(count = "neighbor_table_list_count")]
	pub neighbor_table_list: Vec<NeighborTableEntry>
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ManagementLeaveRequest {
	pub device_address: u64,
	//bit 6 remove children, bit 7 rejoin
	pub remove_children_rejoin: u8
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ManagementLeaveResponse {
	pub status: u8
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ManagementPermitJoiningRequest {
	pub permit_duration: u8,
	pub tc_significance: u8
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ManagementPermitJoiningResponse {
	pub status: u8
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZdoCommand {
	IeeeAddressRequest(IeeeAddressRequest),
	IeeeAddressResponse(IeeeAddressResponse),
	NodeDescriptorRequest(NodeDescriptorRequest),
	NodeDescriptorResponse(NodeDescriptorResponse),
	DeviceAnnounce(DeviceAnnounce),
	ManagementLqiRequest(ManagementLqiRequest),
	ManagementLqiResponse(ManagementLqiResponse),
	ManagementLeaveRequest(ManagementLeaveRequest),
	ManagementLeaveResponse(ManagementLeaveResponse),
	ManagementPermitJoiningRequest(ManagementPermitJoiningRequest),
	ManagementPermitJoiningResponse(ManagementPermitJoiningResponse)
}

impl ZdoCommand {
	pub fn cluster_id(&self) -> u16 {
		match self {
			Self::IeeeAddressRequest(_) => IEEE_ADDRESS_REQUEST,
			Self::IeeeAddressResponse(_) => IEEE_ADDRESS_REQUEST | RESPONSE_FLAG,
			Self::NodeDescriptorRequest(_) => NODE_DESCRIPTOR_REQUEST,
			Self::NodeDescriptorResponse(_) => NODE_DESCRIPTOR_REQUEST | RESPONSE_FLAG,
			Self::DeviceAnnounce(_) => DEVICE_ANNOUNCE,
			Self::ManagementLqiRequest(_) => MANAGEMENT_LQI_REQUEST,
			Self::ManagementLqiResponse(_) => MANAGEMENT_LQI_REQUEST | RESPONSE_FLAG,
			Self::ManagementLeaveRequest(_) => MANAGEMENT_LEAVE_REQUEST,
			Self::ManagementLeaveResponse(_) => MANAGEMENT_LEAVE_REQUEST | RESPONSE_FLAG,
			Self::ManagementPermitJoiningRequest(_) => MANAGEMENT_PERMIT_JOINING_REQUEST,
			Self::ManagementPermitJoiningResponse(_) => MANAGEMENT_PERMIT_JOINING_REQUEST | RESPONSE_FLAG
		}
	}

	pub fn is_response(&self) -> bool {
		self.cluster_id() & RESPONSE_FLAG != 0
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
		Ok(match self {
			Self::IeeeAddressRequest(c) => DekuContainerWrite::to_bytes(c)?,
			Self::IeeeAddressResponse(c) => DekuContainerWrite::to_bytes(c)?,
			Self::NodeDescriptorRequest(c) => DekuContainerWrite::to_bytes(c)?,
			Self::NodeDescriptorResponse(c) => DekuContainerWrite::to_bytes(c)?,
			Self::DeviceAnnounce(c) => DekuContainerWrite::to_bytes(c)?,
			Self::ManagementLqiRequest(c) => DekuContainerWrite::to_bytes(c)?,
			Self::ManagementLqiResponse(c) => DekuContainerWrite::to_bytes(c)?,
			Self::ManagementLeaveRequest(c) => DekuContainerWrite::to_bytes(c)?,
			Self::ManagementLeaveResponse(c) => DekuContainerWrite::to_bytes(c)?,
			Self::ManagementPermitJoiningRequest(c) => DekuContainerWrite::to_bytes(c)?,
			Self::ManagementPermitJoiningResponse(c) => DekuContainerWrite::to_bytes(c)?
		})
	}

	pub fn from_buf(buf: &[u8], cluster_id: u16) -> Result<Self, Error> {
		match cluster_id {
			IEEE_ADDRESS_REQUEST => Ok(Self::IeeeAddressRequest(IeeeAddressRequest::try_from(buf)?)),
			0x8001 => Ok(Self::IeeeAddressResponse(IeeeAddressResponse::try_from(buf)?)),
			NODE_DESCRIPTOR_REQUEST => Ok(Self::NodeDescriptorRequest(NodeDescriptorRequest::try_from(buf)?)),
			0x8002 => Ok(Self::NodeDescriptorResponse(NodeDescriptorResponse::try_from(buf)?)),
			DEVICE_ANNOUNCE => Ok(Self::DeviceAnnounce(DeviceAnnounce::try_from(buf)?)),
			MANAGEMENT_LQI_REQUEST => Ok(Self::ManagementLqiRequest(ManagementLqiRequest::try_from(buf)?)),
			0x8031 => Ok(Self::ManagementLqiResponse(ManagementLqiResponse::try_from(buf)?)),
			MANAGEMENT_LEAVE_REQUEST => Ok(Self::ManagementLeaveRequest(ManagementLeaveRequest::try_from(buf)?)),
			0x8034 => Ok(Self::ManagementLeaveResponse(ManagementLeaveResponse::try_from(buf)?)),
			MANAGEMENT_PERMIT_JOINING_REQUEST => Ok(Self::ManagementPermitJoiningRequest(ManagementPermitJoiningRequest::try_from(buf)?)),
			0x8036 => Ok(Self::ManagementPermitJoiningResponse(ManagementPermitJoiningResponse::try_from(buf)?)),
			other => Err(Error::UnknownCluster(other))
		}
	}
}

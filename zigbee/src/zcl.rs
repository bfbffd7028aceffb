//zigbee cluster library, profile 0x0104

use deku::{ self, prelude::* };
use serialization::{ ZigBeeSerializer, ZigBeeDeserializer };

use crate::address::ZigBeeDeviceAddress;

pub const CLUSTER_ON_OFF: u16 = 0x0006;
pub const CLUSTER_LEVEL_CONTROL: u16 = 0x0008;
pub const CLUSTER_IAS_ZONE: u16 = 0x0500;

#[derive(Debug)]
pub enum Error {
	Deku(deku::DekuError),
	Serialization(serialization::Error),
	BufferTooSmall(&'static str),
	UnknownCommand {
		cluster_id: u16,
		command_id: u8
	}
}

impl core::fmt::Display for Error {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Deku(e) => e.fmt(f),
			Self::Serialization(e) => e.fmt(f),
			Self::BufferTooSmall(s) => write!(f, "Buffer too small: {}", s),
			Self::UnknownCommand { cluster_id, command_id } => write!(f, "Unknown command (cluster: {:#06x}, command: {:#04x})", cluster_id, command_id)
		}
	}
}

impl From<deku::DekuError> for Error {
	fn from(e: deku::DekuError) -> Self {
		Error::Deku(e)
	}
}

impl From<serialization::Error> for Error {
	fn from(e: serialization::Error) -> Self {
		Error::Serialization(e)
	}
}

//frame control bits 0-1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZclFrameType {
	EntireProfile,
	ClusterSpecific
}

//frame control bit 3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZclCommandDirection {
	ClientToServer,
	ServerToClient
}

#[derive(Debug, DekuRead, DekuWrite, Clone)]
pub struct ZclFrameControl {
	#[deku(bits = 1, pad_bits_before = "3")]
	pub disable_default_response: bool,
	#[deku(bits = 1)]
	pub direction: u8,
	#[deku(bits = 1)]
	pub manufacturer_specific: u8,
	#[deku(bits = 2)]
	pub frame_type: u8
}

//header preceding every zcl command inside the aps payload
#[derive(Debug, Clone, PartialEq)]
pub struct ZclHeader {
	pub frame_type: ZclFrameType,
	pub direction: ZclCommandDirection,
	pub disable_default_response: bool,
	pub manufacturer_code: Option<u16>,
	pub sequence_number: u8
}

impl ZclHeader {
	pub fn write(&self, serializer: &mut dyn ZigBeeSerializer) -> Result<(), Error> {
		let control = ZclFrameControl {
			disable_default_response: self.disable_default_response,
			direction: match self.direction {
				ZclCommandDirection::ClientToServer => 0,
				ZclCommandDirection::ServerToClient => 1
			},
			manufacturer_specific: self.manufacturer_code.is_some() as u8,
			frame_type: match self.frame_type {
				ZclFrameType::EntireProfile => 0,
				ZclFrameType::ClusterSpecific => 1
			}
		};

		serializer.write_u8(control.to_bytes()?[0]);

		if let Some(code) = self.manufacturer_code {
			serializer.write_u16(code);
		}

		serializer.write_u8(self.sequence_number);

		Ok(())
	}

	pub fn read(deserializer: &mut dyn ZigBeeDeserializer) -> Result<Self, Error> {
		let control_byte = deserializer.read_u8()?;
		let control = ZclFrameControl::try_from([control_byte].as_slice())?;

		let manufacturer_code = match control.manufacturer_specific {
			1 => Some(deserializer.read_u16()?),
			_ => None
		};

		let sequence_number = deserializer.read_u8()?;

		Ok(ZclHeader {
			frame_type: match control.frame_type {
				0 => ZclFrameType::EntireProfile,
				_ => ZclFrameType::ClusterSpecific
			},
			direction: match control.direction {
				0 => ZclCommandDirection::ClientToServer,
				_ => ZclCommandDirection::ServerToClient
			},
			disable_default_response: control.disable_default_response,
			manufacturer_code,
			sequence_number
		})
	}
}

//attribute data, tagged with the zcl data type byte
#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
#[deku(id_type = "u8")]
pub enum AttributeValue {
	#[deku(id = "0x00")]
	NoData,
	#[deku(id = "0x10")]
	Bool {
		value: u8
	},
	#[deku(id = "0x18")]
	Bitmap8 {
		value: u8
	},
	#[deku(id = "0x19")]
	Bitmap16 {
		value: u16
	},
	#[deku(id = "0x20")]
	Uint8 {
		value: u8
	},
	#[deku(id = "0x21")]
	Uint16 {
		value: u16
	},
	#[deku(id = "0x22")]
	Uint24 {
		#[deku(bits = 24)]
		value: u32
	},
	#[deku(id = "0x23")]
	Uint32 {
		value: u32
	},
	#[deku(id = "0x27")]
	Uint64 {
		value: u64
	},
	#[deku(id = "0x28")]
	Int8 {
		value: i8
	},
	#[deku(id = "0x29")]
	Int16 {
		value: i16
	},
	#[deku(id = "0x2b")]
	Int32 {
		value: i32
	},
	#[deku(id = "0x30")]
	Enum8 {
		value: u8
	},
	#[deku(id = "0x31")]
	Enum16 {
		value: u16
	},
	#[deku(id = "0x39")]
	Single {
		value: f32
	},
	#[deku(id = "0x3a")]
	Double {
		value: f64
	},
	#[deku(id = "0x41")]
	OctetString {
		count: u8,
		#[deku(count = "count")]
		data: Vec<u8>
	},
	#[deku(id = "0x42")]
	CharacterString {
		count: u8,
		#[deku(count = "count")]
		data: Vec<u8>
	},
	#[deku(id = "0xe2")]
	Utc {
		value: u32
	},
	#[deku(id = "0xe8")]
	ClusterId {
		value: u16
	},
	#[deku(id = "0xe9")]
	AttributeId {
		value: u16
	},
	#[deku(id = "0xf0")]
	IeeeAddress {
		value: u64
	},
	#[deku(id = "0xf1")]
	SecurityKey {
		value: [u8; 16]
	}
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct AttributeReport {
	pub identifier: u16,
	pub value: AttributeValue
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct AttributeStatusRecord {
	pub status: u8,
	pub identifier: u16
}

#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
pub struct ReadAttributeRecord {
	pub identifier: u16,
	pub status: u8,
	#[deku(cond = "*status == 0")]
	pub value: Option<AttributeValue>
}

//profile wide commands, valid on any cluster
#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
#[deku(id_type = "u8")]
pub enum GenericCommand {
	#[deku(id = "0x00")]
	ReadAttributes {
		#[deku(read_all)]
		identifiers: Vec<u16>
	},
	#[deku(id = "0x01")]
	ReadAttributesResponse {
		#[deku(read_all)]
		records: Vec<ReadAttributeRecord>
	},
	#[deku(id = "0x02")]
	WriteAttributes {
		#[deku(read_all)]
		records: Vec<AttributeReport>
	},
	#[deku(id = "0x04")]
	WriteAttributesResponse {
		#[deku(read_all)]
		records: Vec<AttributeStatusRecord>
	},
	#[deku(id = "0x0a")]
	ReportAttributes {
		#[deku(read_all)]
		records: Vec<AttributeReport>
	},
	#[deku(id = "0x0b")]
	DefaultResponse {
		command_id: u8,
		status: u8
	}
}

//cluster 0x0006 requests
#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
#[deku(id_type = "u8")]
pub enum OnOffCommand {
	#[deku(id = "0x00")]
	Off,
	#[deku(id = "0x01")]
	On,
	#[deku(id = "0x02")]
	Toggle,
	#[deku(id = "0x40")]
	OffWithEffect {
		effect_identifier: u8,
		effect_variant: u8
	},
	#[deku(id = "0x42")]
	OnWithTimedOff {
		on_off_control: u8,
		on_time: u16,
		off_wait_time: u16
	}
}

//cluster 0x0008 requests
#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
#[deku(id_type = "u8")]
pub enum LevelCommand {
	#[deku(id = "0x00")]
	MoveToLevel {
		level: u8,
		transition_time: u16
	},
	#[deku(id = "0x01")]
	Move {
		move_mode: u8,
		rate: u8
	},
	#[deku(id = "0x02")]
	Step {
		step_mode: u8,
		step_size: u8,
		transition_time: u16
	},
	#[deku(id = "0x03")]
	Stop,
	#[deku(id = "0x04")]
	MoveToLevelWithOnOff {
		level: u8,
		transition_time: u16
	}
}

//cluster 0x0500 notifications, sent server to client
#[derive(Debug, DekuRead, DekuWrite, Clone, PartialEq)]
#[deku(id_type = "u8")]
pub enum ZoneCommand {
	#[deku(id = "0x00")]
	StatusChangeNotification {
		zone_status: u16,
		extended_status: u8,
		zone_id: u8,
		delay: u16
	},
	#[deku(id = "0x01")]
	EnrollRequest {
		zone_type: u16,
		manufacturer_code: u16
	}
}

//the command body catalogue; resolution by (frame type, cluster, direction)
//is an enum match, so an unknown command is a decode error and nothing else
#[derive(Debug, Clone, PartialEq)]
pub enum ZclCommandBody {
	Generic(GenericCommand),
	OnOff(OnOffCommand),
	Level(LevelCommand),
	Zone(ZoneCommand)
}

impl ZclCommandBody {
	pub fn is_generic(&self) -> bool {
		matches!(self, Self::Generic(_))
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
		Ok(match self {
			Self::Generic(c) => DekuContainerWrite::to_bytes(c)?,
			Self::OnOff(c) => DekuContainerWrite::to_bytes(c)?,
			Self::Level(c) => DekuContainerWrite::to_bytes(c)?,
			Self::Zone(c) => DekuContainerWrite::to_bytes(c)?
		})
	}

	pub fn from_buf(buf: &[u8], frame_type: ZclFrameType, cluster_id: u16, direction: ZclCommandDirection) -> Result<Self, Error> {
		if buf.is_empty() {
			return Err(Error::BufferTooSmall("No command id"));
		}

		match frame_type {
			ZclFrameType::EntireProfile => Ok(Self::Generic(GenericCommand::try_from(buf)?)),
			ZclFrameType::ClusterSpecific => match (cluster_id, direction) {
				(CLUSTER_ON_OFF, ZclCommandDirection::ClientToServer) => Ok(Self::OnOff(OnOffCommand::try_from(buf)?)),
				(CLUSTER_LEVEL_CONTROL, ZclCommandDirection::ClientToServer) => Ok(Self::Level(LevelCommand::try_from(buf)?)),
				(CLUSTER_IAS_ZONE, ZclCommandDirection::ServerToClient) => Ok(Self::Zone(ZoneCommand::try_from(buf)?)),
				_ => Err(Error::UnknownCommand {
					cluster_id,
					command_id: buf[0]
				})
			}
		}
	}
}

//a zcl command bound to a cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ZclCommand {
	pub cluster_id: u16,
	pub direction: ZclCommandDirection,
	pub disable_default_response: bool,
	pub body: ZclCommandBody
}

impl ZclCommand {
	pub fn new(cluster_id: u16, body: ZclCommandBody) -> Self {
		ZclCommand {
			cluster_id,
			direction: ZclCommandDirection::ClientToServer,
			disable_default_response: false,
			body
		}
	}

	pub fn is_generic(&self) -> bool {
		self.body.is_generic()
	}
}

//an addressed cluster instance, the target of the attribute convenience calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZclCluster {
	pub address: ZigBeeDeviceAddress,
	pub cluster_id: u16
}

impl ZclCluster {
	pub fn new(address: ZigBeeDeviceAddress, cluster_id: u16) -> Self {
		ZclCluster {
			address,
			cluster_id
		}
	}
}

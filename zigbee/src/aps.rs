//application support sublayer frame as exchanged with the transport

pub const PROFILE_ZDO: u16 = 0x0000;
pub const PROFILE_HOME_AUTOMATION: u16 = 0x0104;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZigBeeNwkAddressMode {
	#[default]
	Device,
	Group
}

#[derive(Debug, Clone, Default)]
pub struct ZigBeeApsFrame {
	pub profile: u16,
	pub cluster: u16,
	pub source_address: u16,
	pub source_endpoint: u8,
	pub destination_address: u16,
	pub destination_endpoint: u8,
	pub aps_counter: u8,
	pub sequence: u8,
	pub radius: u8,
	pub address_mode: ZigBeeNwkAddressMode,
	pub payload: Vec<u8>
}

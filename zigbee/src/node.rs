//mesh model entities

use serde::{ Serialize, Deserialize };

use crate::address::{ IeeeAddress, ZigBeeDeviceAddress };
use crate::zdo::NeighborTableEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ZigBeeNodeType {
	Coordinator,
	Router,
	EndDevice,
	#[default]
	Unknown
}

//a radio participant, keyed by its 16 bit network address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigBeeNode {
	pub network_address: u16,
	pub ieee_address: IeeeAddress,
	#[serde(default)]
	pub node_type: ZigBeeNodeType,
	#[serde(default)]
	pub neighbors: Vec<NeighborTableEntry>
}

impl ZigBeeNode {
	pub fn new(network_address: u16, ieee_address: IeeeAddress) -> Self {
		ZigBeeNode {
			network_address,
			ieee_address,
			node_type: ZigBeeNodeType::Unknown,
			neighbors: Vec::new()
		}
	}
}

//an application instance on a node, keyed by (network address, endpoint)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigBeeDevice {
	pub device_address: ZigBeeDeviceAddress,
	pub ieee_address: IeeeAddress,
	pub profile_id: u16,
	pub device_id: u16,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub input_clusters: Vec<u16>,
	#[serde(default)]
	pub output_clusters: Vec<u16>
}

impl ZigBeeDevice {
	pub fn new(device_address: ZigBeeDeviceAddress, ieee_address: IeeeAddress) -> Self {
		ZigBeeDevice {
			device_address,
			ieee_address,
			profile_id: crate::aps::PROFILE_HOME_AUTOMATION,
			device_id: 0,
			label: None,
			input_clusters: Vec::new(),
			output_clusters: Vec::new()
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZigBeeGroup {
	pub group_id: u16,
	pub label: Option<String>
}

impl ZigBeeGroup {
	pub fn new(group_id: u16, label: Option<String>) -> Self {
		ZigBeeGroup {
			group_id,
			label
		}
	}
}

//network state persistence across restarts

use std::path::PathBuf;

use serde::{ Serialize, Deserialize };
use tracing::warn;

use crate::network::ZigBeeNetworkManager;
use crate::node::{ ZigBeeDevice, ZigBeeGroup, ZigBeeNode };

//the on disk format is owned by the adapter, not by the manager
pub trait NetworkStateSerializer: Send + Sync {
	//called during initialize to repopulate the mesh model
	fn deserialize(&self, network: &ZigBeeNetworkManager);

	//called on shutdown and after each mesh model mutation
	fn serialize(&self, network: &ZigBeeNetworkManager);
}

//point in time copy of the mesh model
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
	pub nodes: Vec<ZigBeeNode>,
	pub devices: Vec<ZigBeeDevice>,
	pub groups: Vec<ZigBeeGroup>
}

impl NetworkSnapshot {
	pub fn capture(network: &ZigBeeNetworkManager) -> Self {
		NetworkSnapshot {
			nodes: network.get_nodes(),
			devices: network.get_devices(),
			groups: network.get_groups()
		}
	}

	pub fn restore(self, network: &ZigBeeNetworkManager) {
		for node in self.nodes {
			network.add_node(node);
		}

		for device in self.devices {
			network.add_device(device);
		}

		for group in self.groups {
			network.add_group(group);
		}
	}
}

//json file adapter
pub struct FileNetworkStateSerializer {
	path: PathBuf
}

impl FileNetworkStateSerializer {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		FileNetworkStateSerializer {
			path: path.into()
		}
	}
}

impl NetworkStateSerializer for FileNetworkStateSerializer {
	fn deserialize(&self, network: &ZigBeeNetworkManager) {
		let data = match std::fs::read_to_string(&self.path) {
			Ok(data) => data,
			//no saved state yet
			Err(_) => {
				return;
			}
		};

		match serde_json::from_str::<NetworkSnapshot>(&data) {
			Ok(snapshot) => snapshot.restore(network),
			Err(e) => warn!("bad network state file {}: {}", self.path.display(), e)
		}
	}

	fn serialize(&self, network: &ZigBeeNetworkManager) {
		let snapshot = NetworkSnapshot::capture(network);

		match serde_json::to_string_pretty(&snapshot) {
			Ok(data) => {
				if let Err(e) = std::fs::write(&self.path, data) {
					warn!("error writing network state {}: {}", self.path.display(), e);
				}
			},
			Err(e) => warn!("error serializing network state: {}", e)
		}
	}
}

//network discovery and mesh monitoring background services

use std::sync::{ Arc, Weak };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::time::Duration;

use tracing::debug;

use crate::address::{ IeeeAddress, ZigBeeAddress, ZigBeeDeviceAddress };
use crate::command::{ CommandListener, CommandPayload, CommandResult, DeviceAnnounceListener, ZdoResponseMatcher, ZigBeeCommand };
use crate::compat::task;
use crate::network::ZigBeeNetworkManager;
use crate::node::{ ZigBeeNode, ZigBeeNodeType };
use crate::zdo::{ self, ZdoCommand };

//watches for joining devices and interrogates them for their identity
pub struct ZigBeeNetworkDiscoverer {
	manager: Weak<ZigBeeNetworkManager>,
	running: AtomicBool
}

impl ZigBeeNetworkDiscoverer {
	pub fn new(manager: Weak<ZigBeeNetworkManager>) -> Arc<Self> {
		Arc::new(ZigBeeNetworkDiscoverer {
			manager,
			running: AtomicBool::new(false)
		})
	}

	pub fn startup(self: &Arc<Self>, manager: &ZigBeeNetworkManager) {
		self.running.store(true, Ordering::SeqCst);

		manager.add_announce_listener(self.clone());
		manager.add_command_listener(self.clone());
	}

	pub fn shutdown(self: &Arc<Self>, manager: &ZigBeeNetworkManager) {
		self.running.store(false, Ordering::SeqCst);

		let announce: Arc<dyn DeviceAnnounceListener> = self.clone();
		manager.remove_announce_listener(&announce);

		let command: Arc<dyn CommandListener> = self.clone();
		manager.remove_command_listener(&command);
	}

	fn node_from_announce(announce: &zdo::DeviceAnnounce) -> ZigBeeNode {
		let mut node = ZigBeeNode::new(announce.nwk_addr, IeeeAddress(announce.ieee_addr));

		node.node_type = if announce.capability.full_function_device {
			ZigBeeNodeType::Router
		}
		else {
			ZigBeeNodeType::EndDevice
		};

		node
	}
}

impl CommandListener for ZigBeeNetworkDiscoverer {
	fn command_received(&self, command: &ZigBeeCommand) {
		if !self.running.load(Ordering::SeqCst) {
			return;
		}

		if let CommandPayload::Zdo(ZdoCommand::DeviceAnnounce(announce)) = &command.payload {
			let manager = match self.manager.upgrade() {
				Some(manager) => manager,
				None => {
					return;
				}
			};

			debug!("device announce from {:#06x}", announce.nwk_addr);

			let node = Self::node_from_announce(announce);

			if manager.get_node(node.network_address).is_some() {
				manager.update_node(node);
			}
			else {
				manager.add_node(node);
			}
		}
	}
}

impl DeviceAnnounceListener for ZigBeeNetworkDiscoverer {
	fn device_announced(&self, address: u16) {
		if !self.running.load(Ordering::SeqCst) {
			return;
		}

		let manager = match self.manager.upgrade() {
			Some(manager) => manager,
			None => {
				return;
			}
		};

		if manager.get_node(address).is_some() {
			return;
		}

		//ask the node for its ieee address, then take it into the model
		task::spawn(async move {
			let request = zdo::IeeeAddressRequest {
				nwk_addr_of_interest: address,
				request_type: 0,
				start_index: 0
			};

			let mut command = ZigBeeCommand::zdo(ZdoCommand::IeeeAddressRequest(request));

			command.destination_address = Some(ZigBeeAddress::Device(ZigBeeDeviceAddress::new(address, 0)));

			let result = manager.unicast(command, Arc::new(ZdoResponseMatcher)).await;

			match result {
				CommandResult::Received(response) => {
					if let CommandPayload::Zdo(ZdoCommand::IeeeAddressResponse(response)) = &response.payload {
						if response.status == 0 {
							manager.add_node(ZigBeeNode::new(response.nwk_addr, IeeeAddress(response.ieee_addr)));
						}
					}
				},
				other => {
					debug!("no ieee address response from {:#06x}, empty: {}", address, other.is_empty());
				}
			}
		});
	}
}

//periodically refreshes neighbor tables via management lqi requests
pub struct ZigBeeNetworkMeshMonitor {
	manager: Weak<ZigBeeNetworkManager>,
	running: Arc<AtomicBool>
}

impl ZigBeeNetworkMeshMonitor {
	pub fn new(manager: Weak<ZigBeeNetworkManager>) -> Arc<Self> {
		Arc::new(ZigBeeNetworkMeshMonitor {
			manager,
			running: Arc::new(AtomicBool::new(false))
		})
	}

	pub fn startup(self: &Arc<Self>, period: Duration) {
		self.running.store(true, Ordering::SeqCst);

		let running = self.running.clone();
		let manager = self.manager.clone();

		task::spawn(async move {
			loop {
				task::sleep(period).await;

				if !running.load(Ordering::SeqCst) {
					break;
				}

				let manager = match manager.upgrade() {
					Some(manager) => manager,
					None => {
						break;
					}
				};

				for node in manager.get_nodes() {
					Self::poll_node(&manager, node).await;
				}
			}
		});
	}

	pub fn shutdown(&self) {
		self.running.store(false, Ordering::SeqCst);
	}

	async fn poll_node(manager: &Arc<ZigBeeNetworkManager>, node: ZigBeeNode) {
		let request = zdo::ManagementLqiRequest {
			start_index: 0
		};

		let mut command = ZigBeeCommand::zdo(ZdoCommand::ManagementLqiRequest(request));

		command.destination_address = Some(ZigBeeAddress::Device(ZigBeeDeviceAddress::new(node.network_address, 0)));

		let result = manager.unicast(command, Arc::new(ZdoResponseMatcher)).await;

		match result {
			CommandResult::Received(response) => {
				if let CommandPayload::Zdo(ZdoCommand::ManagementLqiResponse(lqi)) = response.payload {
					if lqi.status == 0 {
						let mut node = node;

						node.neighbors = lqi.neighbor_table_list;
						manager.update_node(node);
					}
				}
			},
			_ => {
				debug!("no lqi response from {:#06x}", node.network_address);
			}
		}
	}
}

//command envelope, results, response matchers and listener contracts

use crate::address::ZigBeeAddress;
use crate::node::{ ZigBeeDevice, ZigBeeNode };
use crate::transport::ZigBeeTransportState;
use crate::zcl::ZclCommand;
use crate::zdo::{ self, ZdoCommand };

#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
	Zcl(ZclCommand),
	Zdo(ZdoCommand)
}

//one command per send or receive, addressed and bound to a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ZigBeeCommand {
	pub source_address: Option<ZigBeeAddress>,
	pub destination_address: Option<ZigBeeAddress>,
	pub transaction_id: Option<u8>,
	pub payload: CommandPayload
}

impl ZigBeeCommand {
	pub fn zcl(command: ZclCommand) -> Self {
		ZigBeeCommand {
			source_address: None,
			destination_address: None,
			transaction_id: None,
			payload: CommandPayload::Zcl(command)
		}
	}

	pub fn zdo(command: ZdoCommand) -> Self {
		ZigBeeCommand {
			source_address: None,
			destination_address: None,
			transaction_id: None,
			payload: CommandPayload::Zdo(command)
		}
	}

	pub fn cluster_id(&self) -> u16 {
		match &self.payload {
			CommandPayload::Zcl(command) => command.cluster_id,
			CommandPayload::Zdo(command) => command.cluster_id()
		}
	}

	pub fn zcl_command(&self) -> Option<&ZclCommand> {
		match &self.payload {
			CommandPayload::Zcl(command) => Some(command),
			_ => None
		}
	}

	pub fn zdo_command(&self) -> Option<&ZdoCommand> {
		match &self.payload {
			CommandPayload::Zdo(command) => Some(command),
			_ => None
		}
	}

	fn source_network_address(&self) -> Option<u16> {
		self.source_address.as_ref().and_then(|a| a.network_address())
	}

	fn destination_network_address(&self) -> Option<u16> {
		self.destination_address.as_ref().and_then(|a| a.network_address())
	}
}

//outcome of a request; a timed out request completes with None
#[derive(Debug, Clone)]
pub enum CommandResult {
	Received(ZigBeeCommand),
	Broadcast,
	Error(String),
	None
}

impl CommandResult {
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::None)
	}

	pub fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	pub fn response(&self) -> Option<&ZigBeeCommand> {
		match self {
			Self::Received(command) => Some(command),
			_ => None
		}
	}
}

pub trait CommandMatcher: Send + Sync {
	fn is_match(&self, request: &ZigBeeCommand, received: &ZigBeeCommand) -> bool;
}

//default zcl matcher: source address, cluster id, transaction id, direction
pub struct ZclResponseMatcher;

impl CommandMatcher for ZclResponseMatcher {
	fn is_match(&self, request: &ZigBeeCommand, received: &ZigBeeCommand) -> bool {
		let (request_zcl, received_zcl) = match (request.zcl_command(), received.zcl_command()) {
			(Some(a), Some(b)) => (a, b),
			_ => {
				return false;
			}
		};

		if received_zcl.direction == request_zcl.direction {
			return false;
		}

		if received_zcl.cluster_id != request_zcl.cluster_id {
			return false;
		}

		if received.source_network_address() != request.destination_network_address() {
			return false;
		}

		request.transaction_id.is_some() && request.transaction_id == received.transaction_id
	}
}

//permissive matcher for attribute reads and writes: sender and transaction only
pub struct ZclTransactionMatcher;

impl CommandMatcher for ZclTransactionMatcher {
	fn is_match(&self, request: &ZigBeeCommand, received: &ZigBeeCommand) -> bool {
		if received.zcl_command().is_none() {
			return false;
		}

		if received.source_network_address() != request.destination_network_address() {
			return false;
		}

		request.transaction_id.is_some() && request.transaction_id == received.transaction_id
	}
}

//zdo matcher: the response cluster is the request cluster with bit 15 set
pub struct ZdoResponseMatcher;

impl CommandMatcher for ZdoResponseMatcher {
	fn is_match(&self, request: &ZigBeeCommand, received: &ZigBeeCommand) -> bool {
		let request_zdo = match request.zdo_command() {
			Some(command) => command,
			None => {
				return false;
			}
		};

		if received.zdo_command().is_none() {
			return false;
		}

		if received.cluster_id() != (request_zdo.cluster_id() | zdo::RESPONSE_FLAG) {
			return false;
		}

		if received.source_network_address() != request.destination_network_address() {
			return false;
		}

		request.transaction_id.is_some() && request.transaction_id == received.transaction_id
	}
}

pub trait CommandListener: Send + Sync {
	fn command_received(&self, command: &ZigBeeCommand);
}

pub trait ZigBeeNetworkNodeListener: Send + Sync {
	fn node_added(&self, _node: &ZigBeeNode) {}
	fn node_updated(&self, _node: &ZigBeeNode) {}
	fn node_removed(&self, _node: &ZigBeeNode) {}
}

pub trait ZigBeeNetworkDeviceListener: Send + Sync {
	fn device_added(&self, _device: &ZigBeeDevice) {}
	fn device_updated(&self, _device: &ZigBeeDevice) {}
	fn device_removed(&self, _device: &ZigBeeDevice) {}
}

pub trait ZigBeeNetworkStateListener: Send + Sync {
	fn network_state_updated(&self, state: ZigBeeTransportState);
}

pub trait DeviceAnnounceListener: Send + Sync {
	fn device_announced(&self, address: u16);
}

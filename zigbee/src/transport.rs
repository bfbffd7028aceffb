//contract towards the radio coprocessor driving phy, mac and nwk

use std::sync::Arc;
use serde::{ Serialize, Deserialize };
use rand::Rng;

use crate::aps::ZigBeeApsFrame;

#[derive(Debug)]
pub enum Error {
	Send(String),
	Configuration,
	Startup
}

impl core::fmt::Display for Error {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::Send(s) => write!(f, "Send failed: {}", s),
			Self::Configuration => write!(f, "Configuration rejected by transport"),
			Self::Startup => write!(f, "Transport startup failed")
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZigBeeInitializeResponse {
	//initialized and currently joined to a network
	Joined,
	//initialized but not joined
	NotJoined,
	Failed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZigBeeTransportState {
	Uninitialized,
	Initializing,
	Online,
	Offline
}

//16 octet network or link key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZigBeeKey(#[serde(with = "hex::serde")] pub [u8; 16]);

pub trait ZigBeeTransport: Send + Sync {
	fn initialize(&self) -> ZigBeeInitializeResponse;
	fn startup(&self, reinitialize: bool) -> bool;
	fn shutdown(&self);

	fn get_channel(&self) -> u8;
	fn set_channel(&self, channel: u8) -> bool;
	fn get_pan_id(&self) -> u16;
	fn set_pan_id(&self, pan_id: u16) -> bool;
	fn get_extended_pan_id(&self) -> u64;
	fn set_extended_pan_id(&self, extended_pan_id: u64) -> bool;
	fn set_security_key(&self, key: &ZigBeeKey) -> bool;

	fn send_command(&self, frame: ZigBeeApsFrame) -> Result<(), Error>;

	fn set_receiver(&self, receiver: Arc<dyn ZigBeeTransportReceive>);
}

//implemented by the network manager, driven by the transport
pub trait ZigBeeTransportReceive: Send + Sync {
	fn receive_command(&self, frame: ZigBeeApsFrame);
	fn set_network_state(&self, state: ZigBeeTransportState);
	fn announce_device(&self, address: u16);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZigBeeNetworkParameters {
	pub channel: u8,
	pub pan_id: u16,
	#[serde(with = "hex::serde")]
	pub extended_pan_id: [u8; 8],
	#[serde(with = "hex::serde")]
	pub key: [u8; 16]
}

impl ZigBeeNetworkParameters {
	//fresh parameters for forming a new network
	pub fn random() -> Self {
		let mut rng = rand::thread_rng();

		ZigBeeNetworkParameters {
			channel: rng.gen_range(11..=26),
			pan_id: rng.gen_range(0x0001..0x3fff),
			extended_pan_id: rng.gen(),
			key: rng.gen()
		}
	}

	pub fn extended_pan_id_value(&self) -> u64 {
		u64::from_le_bytes(self.extended_pan_id)
	}
}

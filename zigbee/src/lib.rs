//host side zigbee network stack
//drives a radio coprocessor through the transport contract and implements
//the application framework above the aps frame boundary

pub mod compat;

pub mod address;
pub mod aps;
pub mod zcl;
pub mod zdo;
pub mod codec;
pub mod command;
pub mod transport;
pub mod node;
pub mod notify;
pub mod future;
pub mod state;
pub mod network;
pub mod discovery;

pub use address::{ IeeeAddress, ZigBeeAddress, ZigBeeBroadcastDestination, ZigBeeDeviceAddress };
pub use aps::{ ZigBeeApsFrame, ZigBeeNwkAddressMode };
pub use command::{
	CommandListener, CommandMatcher, CommandPayload, CommandResult, DeviceAnnounceListener,
	ZclResponseMatcher, ZclTransactionMatcher, ZdoResponseMatcher, ZigBeeCommand,
	ZigBeeNetworkDeviceListener, ZigBeeNetworkNodeListener, ZigBeeNetworkStateListener
};
pub use future::CommandFuture;
pub use network::{ Error, NetworkState, ZigBeeNetworkManager };
pub use node::{ ZigBeeDevice, ZigBeeGroup, ZigBeeNode, ZigBeeNodeType };
pub use state::{ FileNetworkStateSerializer, NetworkSnapshot, NetworkStateSerializer };
pub use transport::{
	ZigBeeInitializeResponse, ZigBeeKey, ZigBeeNetworkParameters, ZigBeeTransport,
	ZigBeeTransportReceive, ZigBeeTransportState
};
pub use zcl::{ ZclCluster, ZclCommand, ZclCommandBody, ZclCommandDirection };
pub use zdo::ZdoCommand;

//the network manager, hub between client code and the transport
//owns the frame pipelines, the mesh model, the correlator and the lifecycle

use std::collections::HashMap;
use std::sync::{ Arc, Mutex };
use std::sync::atomic::{ AtomicBool, AtomicU8, Ordering };
use std::time::Duration;

use tracing::debug;

use serialization::{ ZigBeeSerializer, ZigBeeDeserializer };

use crate::address::{ IeeeAddress, ZigBeeAddress, ZigBeeBroadcastDestination, ZigBeeDeviceAddress };
use crate::aps::{ self, ZigBeeApsFrame, ZigBeeNwkAddressMode };
use crate::codec::{ Codec, DeserializerFactory, SerializerFactory };
use crate::command::{
	CommandListener, CommandMatcher, CommandPayload, CommandResult, DeviceAnnounceListener,
	ZclResponseMatcher, ZclTransactionMatcher, ZigBeeCommand, ZigBeeNetworkDeviceListener,
	ZigBeeNetworkNodeListener, ZigBeeNetworkStateListener
};
use crate::compat::task;
use crate::discovery::{ ZigBeeNetworkDiscoverer, ZigBeeNetworkMeshMonitor };
use crate::future::{ self, CommandFuture, PendingQueue };
use crate::node::{ ZigBeeDevice, ZigBeeGroup, ZigBeeNode };
use crate::notify::{ ListenerList, NotificationService };
use crate::state::NetworkStateSerializer;
use crate::transport::{
	self, ZigBeeInitializeResponse, ZigBeeKey, ZigBeeNetworkParameters, ZigBeeTransport,
	ZigBeeTransportReceive, ZigBeeTransportState
};
use crate::zcl::{
	AttributeReport, AttributeValue, GenericCommand, ZclCluster, ZclCommand, ZclCommandBody,
	ZclFrameType, ZclHeader
};
use crate::zdo::{ self, ZdoCommand };

const RADIUS: u8 = 31;
const SWEEP_PERIOD: Duration = Duration::from_millis(500);
const MESH_MONITOR_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum Error {
	InvalidState(NetworkState),
	InvalidArgument(&'static str),
	Zcl(crate::zcl::Error),
	Zdo(zdo::Error),
	Serialization(serialization::Error),
	Transport(transport::Error),
	NotImplemented(&'static str)
}

impl core::fmt::Display for Error {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Self::InvalidState(state) => write!(f, "Operation not legal in state {:?}", state),
			Self::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
			Self::Zcl(e) => e.fmt(f),
			Self::Zdo(e) => e.fmt(f),
			Self::Serialization(e) => e.fmt(f),
			Self::Transport(e) => e.fmt(f),
			Self::NotImplemented(s) => write!(f, "Not implemented: {}", s)
		}
	}
}

impl From<crate::zcl::Error> for Error {
	fn from(e: crate::zcl::Error) -> Self {
		Error::Zcl(e)
	}
}

impl From<zdo::Error> for Error {
	fn from(e: zdo::Error) -> Self {
		Error::Zdo(e)
	}
}

impl From<serialization::Error> for Error {
	fn from(e: serialization::Error) -> Self {
		Error::Serialization(e)
	}
}

impl From<transport::Error> for Error {
	fn from(e: transport::Error) -> Self {
		Error::Transport(e)
	}
}

//lifecycle; the boot sequence runs through once, stopped is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
	Uninitialized,
	Initialized,
	Starting,
	Running,
	ShuttingDown,
	Stopped
}

pub struct ZigBeeNetworkManager {
	transport: Arc<dyn ZigBeeTransport>,
	codec: Mutex<Codec>,
	state: Mutex<NetworkState>,

	sequence_number: AtomicU8,
	aps_counter: AtomicU8,

	pending: Arc<PendingQueue>,
	notification_service: NotificationService,

	nodes: Mutex<HashMap<u16, ZigBeeNode>>,
	devices: Mutex<HashMap<ZigBeeDeviceAddress, ZigBeeDevice>>,
	groups: Mutex<HashMap<u16, ZigBeeGroup>>,

	node_listeners: ListenerList<dyn ZigBeeNetworkNodeListener>,
	device_listeners: ListenerList<dyn ZigBeeNetworkDeviceListener>,
	state_listeners: ListenerList<dyn ZigBeeNetworkStateListener>,
	announce_listeners: ListenerList<dyn DeviceAnnounceListener>,
	command_listeners: ListenerList<dyn CommandListener>,

	state_serializer: Mutex<Option<Arc<dyn NetworkStateSerializer>>>,
	restoring: AtomicBool,
	running: Arc<AtomicBool>,

	discoverer: Mutex<Option<Arc<ZigBeeNetworkDiscoverer>>>,
	mesh_monitor: Mutex<Option<Arc<ZigBeeNetworkMeshMonitor>>>
}

impl ZigBeeNetworkManager {
	pub fn new(transport: Arc<dyn ZigBeeTransport>) -> Arc<Self> {
		let manager = Arc::new(ZigBeeNetworkManager {
			transport,
			codec: Mutex::new(Codec::default()),
			state: Mutex::new(NetworkState::Uninitialized),
			sequence_number: AtomicU8::new(0),
			aps_counter: AtomicU8::new(0),
			pending: Arc::new(PendingQueue::new()),
			notification_service: NotificationService::new(),
			nodes: Mutex::new(HashMap::new()),
			devices: Mutex::new(HashMap::new()),
			groups: Mutex::new(HashMap::new()),
			node_listeners: ListenerList::new(),
			device_listeners: ListenerList::new(),
			state_listeners: ListenerList::new(),
			announce_listeners: ListenerList::new(),
			command_listeners: ListenerList::new(),
			state_serializer: Mutex::new(None),
			restoring: AtomicBool::new(false),
			running: Arc::new(AtomicBool::new(false)),
			discoverer: Mutex::new(None),
			mesh_monitor: Mutex::new(None)
		});

		manager.transport.set_receiver(manager.clone());

		manager
	}

	//a fresh serializer pair is constructed per frame from these factories
	pub fn set_serializer(&self, serializer: SerializerFactory, deserializer: DeserializerFactory) {
		*self.codec.lock().unwrap() = Codec::new(serializer, deserializer);
	}

	pub fn set_network_state_serializer(&self, serializer: Arc<dyn NetworkStateSerializer>) {
		*self.state_serializer.lock().unwrap() = Some(serializer);
	}

	pub fn state(&self) -> NetworkState {
		*self.state.lock().unwrap()
	}

	//lifecycle

	pub fn initialize(&self) -> Result<ZigBeeInitializeResponse, Error> {
		let mut state = self.state.lock().unwrap();

		if *state != NetworkState::Uninitialized {
			return Err(Error::InvalidState(*state));
		}

		let serializer = self.state_serializer.lock().unwrap().clone();

		if let Some(serializer) = serializer {
			self.restoring.store(true, Ordering::SeqCst);
			serializer.deserialize(self);
			self.restoring.store(false, Ordering::SeqCst);
		}

		let response = self.transport.initialize();

		if response != ZigBeeInitializeResponse::Failed {
			*state = NetworkState::Initialized;
		}

		Ok(response)
	}

	pub fn get_channel(&self) -> u8 {
		self.transport.get_channel()
	}

	//channels are 11..26
	pub fn set_channel(&self, channel: u8) -> Result<(), Error> {
		self.require_initialized()?;

		if !(11..=26).contains(&channel) {
			return Err(Error::InvalidArgument("channel must be in 11..26"));
		}

		if self.transport.set_channel(channel) {
			Ok(())
		}
		else {
			Err(Error::Transport(transport::Error::Configuration))
		}
	}

	pub fn get_pan_id(&self) -> u16 {
		self.transport.get_pan_id()
	}

	//0xffff lets the transport choose
	pub fn set_pan_id(&self, pan_id: u16) -> Result<(), Error> {
		self.require_initialized()?;

		if pan_id > 0x3fff && pan_id != 0xffff {
			return Err(Error::InvalidArgument("pan id must be in 0..0x3fff or 0xffff"));
		}

		if self.transport.set_pan_id(pan_id) {
			Ok(())
		}
		else {
			Err(Error::Transport(transport::Error::Configuration))
		}
	}

	pub fn get_extended_pan_id(&self) -> u64 {
		self.transport.get_extended_pan_id()
	}

	pub fn set_extended_pan_id(&self, extended_pan_id: u64) -> Result<(), Error> {
		self.require_initialized()?;

		if self.transport.set_extended_pan_id(extended_pan_id) {
			Ok(())
		}
		else {
			Err(Error::Transport(transport::Error::Configuration))
		}
	}

	pub fn set_security_key(&self, key: &ZigBeeKey) -> Result<(), Error> {
		self.require_initialized()?;

		if self.transport.set_security_key(key) {
			Ok(())
		}
		else {
			Err(Error::Transport(transport::Error::Configuration))
		}
	}

	pub fn configure(&self, parameters: &ZigBeeNetworkParameters) -> Result<(), Error> {
		self.set_channel(parameters.channel)?;
		self.set_pan_id(parameters.pan_id)?;
		self.set_extended_pan_id(parameters.extended_pan_id_value())?;
		self.set_security_key(&ZigBeeKey(parameters.key))?;

		Ok(())
	}

	fn require_initialized(&self) -> Result<(), Error> {
		let state = self.state.lock().unwrap();

		if *state != NetworkState::Initialized {
			return Err(Error::InvalidState(*state));
		}

		Ok(())
	}

	pub fn startup(self: &Arc<Self>, reinitialize: bool) -> Result<(), Error> {
		{
			let mut state = self.state.lock().unwrap();

			if *state != NetworkState::Initialized {
				return Err(Error::InvalidState(*state));
			}

			*state = NetworkState::Starting;

			if !self.transport.startup(reinitialize) {
				*state = NetworkState::Initialized;

				return Err(Error::Transport(transport::Error::Startup));
			}

			*state = NetworkState::Running;
		}

		self.running.store(true, Ordering::SeqCst);

		//request expiry sweep
		let pending = self.pending.clone();
		let running = self.running.clone();

		task::spawn(async move {
			while running.load(Ordering::SeqCst) {
				task::sleep(SWEEP_PERIOD).await;
				pending.sweep();
			}
		});

		let discoverer = ZigBeeNetworkDiscoverer::new(Arc::downgrade(self));

		discoverer.startup(self);
		*self.discoverer.lock().unwrap() = Some(discoverer);

		let monitor = ZigBeeNetworkMeshMonitor::new(Arc::downgrade(self));

		monitor.startup(MESH_MONITOR_PERIOD);
		*self.mesh_monitor.lock().unwrap() = Some(monitor);

		Ok(())
	}

	pub fn shutdown(&self) -> Result<(), Error> {
		{
			let mut state = self.state.lock().unwrap();

			match *state {
				NetworkState::Running | NetworkState::Initialized => {
					*state = NetworkState::ShuttingDown;
				},
				NetworkState::ShuttingDown | NetworkState::Stopped => {
					return Ok(());
				},
				other => {
					return Err(Error::InvalidState(other));
				}
			}
		}

		let serializer = self.state_serializer.lock().unwrap().clone();

		if let Some(serializer) = serializer {
			serializer.serialize(self);
		}

		self.running.store(false, Ordering::SeqCst);

		if let Some(discoverer) = self.discoverer.lock().unwrap().take() {
			discoverer.shutdown(self);
		}

		if let Some(monitor) = self.mesh_monitor.lock().unwrap().take() {
			monitor.shutdown();
		}

		self.transport.shutdown();

		*self.state.lock().unwrap() = NetworkState::Stopped;

		Ok(())
	}

	//outbound pipeline

	//builds the aps frame, binds the transaction id and hands off to the
	//transport; returns the allocated transaction id
	pub fn send_command(&self, command: &mut ZigBeeCommand) -> Result<u8, Error> {
		let sequence = self.sequence_number.fetch_add(1, Ordering::SeqCst);

		command.transaction_id = Some(sequence);

		debug!("tx command: {:?}", command);

		let mut frame = ZigBeeApsFrame {
			cluster: command.cluster_id(),
			aps_counter: self.aps_counter.fetch_add(1, Ordering::SeqCst),
			source_address: 0,
			sequence,
			radius: RADIUS,
			..Default::default()
		};

		match command.destination_address {
			Some(ZigBeeAddress::Device(device)) => {
				frame.address_mode = ZigBeeNwkAddressMode::Device;
				frame.destination_address = device.address;
				frame.destination_endpoint = device.endpoint;
			},
			Some(ZigBeeAddress::Group(group_id)) => {
				frame.address_mode = ZigBeeNwkAddressMode::Group;
				frame.destination_address = group_id;
				//todo group sends lose the endpoint, resolve member endpoints from a group table
			},
			None => {
				return Err(Error::InvalidArgument("command has no destination address"));
			}
		}

		let mut serializer = self.codec.lock().unwrap().new_serializer()?;

		match &command.payload {
			CommandPayload::Zdo(zdo_command) => {
				frame.profile = aps::PROFILE_ZDO;

				serializer.write_u8(sequence);
				serializer.write_bytes(&zdo_command.to_bytes()?);
			},
			CommandPayload::Zcl(zcl_command) => {
				frame.profile = aps::PROFILE_HOME_AUTOMATION;

				let header = ZclHeader {
					frame_type: if zcl_command.is_generic() {
						ZclFrameType::EntireProfile
					}
					else {
						ZclFrameType::ClusterSpecific
					},
					direction: zcl_command.direction,
					disable_default_response: zcl_command.disable_default_response,
					manufacturer_code: None,
					sequence_number: sequence
				};

				header.write(serializer.as_mut())?;
				serializer.write_bytes(&zcl_command.body.to_bytes()?);
			}
		}

		frame.payload = serializer.payload();

		self.transport.send_command(frame)?;

		Ok(sequence)
	}

	//inbound pipeline

	fn receive_zdo_command(&self, frame: &ZigBeeApsFrame, payload: Vec<u8>) -> Option<ZigBeeCommand> {
		let mut deserializer = match self.codec.lock().unwrap().new_deserializer(payload) {
			Ok(deserializer) => deserializer,
			Err(e) => {
				debug!("error creating deserializer: {}", e);

				return None;
			}
		};

		let sequence = match deserializer.read_u8() {
			Ok(sequence) => sequence,
			Err(_) => {
				debug!("zdo frame too short, cluster {:#06x}", frame.cluster);

				return None;
			}
		};

		match ZdoCommand::from_buf(&deserializer.remaining(), frame.cluster) {
			Ok(command) => {
				let mut command = ZigBeeCommand::zdo(command);

				command.transaction_id = Some(sequence);

				Some(command)
			},
			Err(e) => {
				debug!("dropping zdo frame: {}", e);

				None
			}
		}
	}

	fn receive_zcl_command(&self, frame: &ZigBeeApsFrame, payload: Vec<u8>) -> Option<ZigBeeCommand> {
		let mut deserializer = match self.codec.lock().unwrap().new_deserializer(payload) {
			Ok(deserializer) => deserializer,
			Err(e) => {
				debug!("error creating deserializer: {}", e);

				return None;
			}
		};

		let header = match ZclHeader::read(deserializer.as_mut()) {
			Ok(header) => header,
			Err(e) => {
				debug!("bad zcl header: {}", e);

				return None;
			}
		};

		match ZclCommandBody::from_buf(&deserializer.remaining(), header.frame_type, frame.cluster, header.direction) {
			Ok(body) => {
				let mut command = ZigBeeCommand::zcl(ZclCommand {
					cluster_id: frame.cluster,
					direction: header.direction,
					disable_default_response: header.disable_default_response,
					body
				});

				command.transaction_id = Some(header.sequence_number);

				Some(command)
			},
			Err(e) => {
				debug!("dropping zcl frame: {}", e);

				None
			}
		}
	}

	fn notify_command_listeners(&self, command: &ZigBeeCommand) {
		let listeners = self.command_listeners.snapshot();

		for listener in listeners.iter() {
			let listener = listener.clone();
			let command = command.clone();

			self.notification_service.execute(move || listener.command_received(&command));
		}
	}

	//request correlation

	pub fn unicast(&self, command: ZigBeeCommand, matcher: Arc<dyn CommandMatcher>) -> CommandFuture {
		let (future, state) = CommandFuture::new();

		self.pending.add(state.clone(), matcher);

		let mut command = command;

		//the entry lock is held across the send, so a matcher never sees
		//a request without its final transaction id
		let sent = {
			let mut pending_state = state.lock().unwrap();

			match self.send_command(&mut command) {
				Ok(_) => {
					pending_state.request = Some(command);

					Ok(())
				},
				Err(e) => Err(e)
			}
		};

		if let Err(e) = sent {
			self.pending.remove(&state);
			future::complete(&state, CommandResult::Error(e.to_string()));
		}

		future
	}

	//fire and forget; the future completes immediately
	pub fn broadcast(&self, command: ZigBeeCommand) -> CommandFuture {
		let mut command = command;

		match self.send_command(&mut command) {
			Ok(_) => CommandFuture::completed(CommandResult::Broadcast),
			Err(e) => CommandFuture::completed(CommandResult::Error(e.to_string()))
		}
	}

	pub fn send(&self, destination: ZigBeeAddress, command: ZclCommand) -> CommandFuture {
		let mut command = ZigBeeCommand::zcl(command);

		command.destination_address = Some(destination);

		if destination.is_group() {
			self.broadcast(command)
		}
		else {
			self.unicast(command, Arc::new(ZclResponseMatcher))
		}
	}

	//convenience operations

	pub fn permit_join(&self, duration: u16) -> Result<(), Error> {
		self.permit_join_to(ZigBeeDeviceAddress::broadcast(ZigBeeBroadcastDestination::RoutersAndCoordinator), duration)
	}

	//durations above 255 are clamped to 255, the permanent enable encoding
	pub fn permit_join_to(&self, destination: ZigBeeDeviceAddress, duration: u16) -> Result<(), Error> {
		debug!("permit join for {} seconds", duration);

		let request = zdo::ManagementPermitJoiningRequest {
			permit_duration: if duration > 255 { 255 } else { duration as u8 },
			tc_significance: 1
		};

		let mut command = ZigBeeCommand::zdo(ZdoCommand::ManagementPermitJoiningRequest(request));

		command.destination_address = Some(ZigBeeAddress::Device(destination));
		self.send_command(&mut command)?;

		Ok(())
	}

	//asks the parent to remove an end device from the network
	pub fn leave(&self, parent_address: u16, device_address: IeeeAddress) -> Result<(), Error> {
		let request = zdo::ManagementLeaveRequest {
			device_address: device_address.0,
			remove_children_rejoin: 0
		};

		let mut command = ZigBeeCommand::zdo(ZdoCommand::ManagementLeaveRequest(request));

		command.destination_address = Some(ZigBeeAddress::Device(ZigBeeDeviceAddress::new(parent_address, 0)));
		self.send_command(&mut command)?;

		Ok(())
	}

	pub fn read(&self, cluster: &ZclCluster, attribute: u16) -> CommandFuture {
		let body = ZclCommandBody::Generic(GenericCommand::ReadAttributes {
			identifiers: vec![attribute]
		});

		let mut command = ZigBeeCommand::zcl(ZclCommand::new(cluster.cluster_id, body));

		command.destination_address = Some(ZigBeeAddress::Device(cluster.address));

		self.unicast(command, Arc::new(ZclTransactionMatcher))
	}

	pub fn write(&self, cluster: &ZclCluster, attribute: u16, value: AttributeValue) -> CommandFuture {
		let body = ZclCommandBody::Generic(GenericCommand::WriteAttributes {
			records: vec![AttributeReport {
				identifier: attribute,
				value
			}]
		});

		let mut command = ZigBeeCommand::zcl(ZclCommand::new(cluster.cluster_id, body));

		command.destination_address = Some(ZigBeeAddress::Device(cluster.address));

		self.unicast(command, Arc::new(ZclTransactionMatcher))
	}

	pub fn bind(&self, _source: &ZigBeeDevice, _destination: &ZigBeeDevice, _cluster_id: u16) -> Result<CommandFuture, Error> {
		Err(Error::NotImplemented("bind request payload is not wired through yet"))
	}

	pub fn unbind(&self, _source: &ZigBeeDevice, _destination: &ZigBeeDevice, _cluster_id: u16) -> Result<CommandFuture, Error> {
		Err(Error::NotImplemented("unbind request payload is not wired through yet"))
	}

	//mesh model - nodes

	pub fn add_node(&self, node: ZigBeeNode) {
		{
			let mut nodes = self.nodes.lock().unwrap();

			//an already known node fires no event
			if nodes.contains_key(&node.network_address) {
				return;
			}

			nodes.insert(node.network_address, node.clone());
		}

		self.notify_node_listeners(&node, |l, n| l.node_added(n));
		self.save_network_state();
	}

	pub fn update_node(&self, node: ZigBeeNode) {
		self.nodes.lock().unwrap().insert(node.network_address, node.clone());

		self.notify_node_listeners(&node, |l, n| l.node_updated(n));
		self.save_network_state();
	}

	pub fn remove_node(&self, network_address: u16) {
		let node = self.nodes.lock().unwrap().remove(&network_address);

		if let Some(node) = node {
			self.notify_node_listeners(&node, |l, n| l.node_removed(n));
			self.save_network_state();
		}
	}

	pub fn get_node(&self, network_address: u16) -> Option<ZigBeeNode> {
		self.nodes.lock().unwrap().get(&network_address).cloned()
	}

	pub fn get_node_by_ieee(&self, ieee_address: IeeeAddress) -> Option<ZigBeeNode> {
		self.nodes.lock().unwrap().values().find(|n| n.ieee_address == ieee_address).cloned()
	}

	pub fn get_nodes(&self) -> Vec<ZigBeeNode> {
		self.nodes.lock().unwrap().values().cloned().collect()
	}

	fn notify_node_listeners(&self, node: &ZigBeeNode, event: fn(&dyn ZigBeeNetworkNodeListener, &ZigBeeNode)) {
		let listeners = self.node_listeners.snapshot();

		for listener in listeners.iter() {
			let listener = listener.clone();
			let node = node.clone();

			self.notification_service.execute(move || event(listener.as_ref(), &node));
		}
	}

	//mesh model - devices

	pub fn add_device(&self, device: ZigBeeDevice) {
		{
			let mut devices = self.devices.lock().unwrap();

			if devices.contains_key(&device.device_address) {
				return;
			}

			devices.insert(device.device_address, device.clone());
		}

		self.notify_device_listeners(&device, |l, d| l.device_added(d));
		self.save_network_state();
	}

	pub fn update_device(&self, device: ZigBeeDevice) {
		self.devices.lock().unwrap().insert(device.device_address, device.clone());

		self.notify_device_listeners(&device, |l, d| l.device_updated(d));
		self.save_network_state();
	}

	pub fn remove_device(&self, device_address: ZigBeeDeviceAddress) {
		let device = self.devices.lock().unwrap().remove(&device_address);

		if let Some(device) = device {
			self.notify_device_listeners(&device, |l, d| l.device_removed(d));
			self.save_network_state();
		}
	}

	pub fn get_device(&self, device_address: ZigBeeDeviceAddress) -> Option<ZigBeeDevice> {
		self.devices.lock().unwrap().get(&device_address).cloned()
	}

	pub fn get_devices(&self) -> Vec<ZigBeeDevice> {
		self.devices.lock().unwrap().values().cloned().collect()
	}

	pub fn get_node_devices(&self, network_address: u16) -> Vec<ZigBeeDevice> {
		self.devices.lock().unwrap().values().filter(|d| d.device_address.address == network_address).cloned().collect()
	}

	pub fn get_node_devices_by_ieee(&self, ieee_address: IeeeAddress) -> Vec<ZigBeeDevice> {
		self.devices.lock().unwrap().values().filter(|d| d.ieee_address == ieee_address).cloned().collect()
	}

	fn notify_device_listeners(&self, device: &ZigBeeDevice, event: fn(&dyn ZigBeeNetworkDeviceListener, &ZigBeeDevice)) {
		let listeners = self.device_listeners.snapshot();

		for listener in listeners.iter() {
			let listener = listener.clone();
			let device = device.clone();

			self.notification_service.execute(move || event(listener.as_ref(), &device));
		}
	}

	//mesh model - groups

	pub fn add_group(&self, group: ZigBeeGroup) {
		{
			let mut groups = self.groups.lock().unwrap();

			if groups.contains_key(&group.group_id) {
				return;
			}

			groups.insert(group.group_id, group);
		}

		self.save_network_state();
	}

	pub fn update_group(&self, group: ZigBeeGroup) {
		self.groups.lock().unwrap().insert(group.group_id, group);
		self.save_network_state();
	}

	pub fn remove_group(&self, group_id: u16) {
		if self.groups.lock().unwrap().remove(&group_id).is_some() {
			self.save_network_state();
		}
	}

	pub fn get_group(&self, group_id: u16) -> Option<ZigBeeGroup> {
		self.groups.lock().unwrap().get(&group_id).cloned()
	}

	pub fn get_groups(&self) -> Vec<ZigBeeGroup> {
		self.groups.lock().unwrap().values().cloned().collect()
	}

	//creates or relabels a group
	pub fn add_membership(&self, group_id: u16, label: &str) {
		match self.get_group(group_id) {
			None => self.add_group(ZigBeeGroup::new(group_id, Some(label.to_string()))),
			Some(mut group) => {
				group.label = Some(label.to_string());
				self.update_group(group);
			}
		}
	}

	pub fn remove_membership(&self, group_id: u16) {
		self.remove_group(group_id);
	}

	//listener registration

	pub fn add_command_listener(&self, listener: Arc<dyn CommandListener>) {
		self.command_listeners.add(listener);
	}

	pub fn remove_command_listener(&self, listener: &Arc<dyn CommandListener>) {
		self.command_listeners.remove(listener);
	}

	pub fn add_node_listener(&self, listener: Arc<dyn ZigBeeNetworkNodeListener>) {
		self.node_listeners.add(listener);
	}

	pub fn remove_node_listener(&self, listener: &Arc<dyn ZigBeeNetworkNodeListener>) {
		self.node_listeners.remove(listener);
	}

	pub fn add_device_listener(&self, listener: Arc<dyn ZigBeeNetworkDeviceListener>) {
		self.device_listeners.add(listener);
	}

	pub fn remove_device_listener(&self, listener: &Arc<dyn ZigBeeNetworkDeviceListener>) {
		self.device_listeners.remove(listener);
	}

	pub fn add_state_listener(&self, listener: Arc<dyn ZigBeeNetworkStateListener>) {
		self.state_listeners.add(listener);
	}

	pub fn remove_state_listener(&self, listener: &Arc<dyn ZigBeeNetworkStateListener>) {
		self.state_listeners.remove(listener);
	}

	pub fn add_announce_listener(&self, listener: Arc<dyn DeviceAnnounceListener>) {
		self.announce_listeners.add(listener);
	}

	pub fn remove_announce_listener(&self, listener: &Arc<dyn DeviceAnnounceListener>) {
		self.announce_listeners.remove(listener);
	}

	//persistence

	fn save_network_state(&self) {
		if self.restoring.load(Ordering::SeqCst) {
			return;
		}

		let serializer = self.state_serializer.lock().unwrap().clone();

		if let Some(serializer) = serializer {
			serializer.serialize(self);
		}
	}
}

impl ZigBeeTransportReceive for ZigBeeNetworkManager {
	fn receive_command(&self, frame: ZigBeeApsFrame) {
		let mut frame = frame;
		let payload = std::mem::take(&mut frame.payload);

		let command = match frame.profile {
			aps::PROFILE_ZDO => self.receive_zdo_command(&frame, payload),
			aps::PROFILE_HOME_AUTOMATION => self.receive_zcl_command(&frame, payload),
			profile => {
				debug!("received message with unknown profile {:#06x}", profile);

				None
			}
		};

		let mut command = match command {
			Some(command) => command,
			None => {
				return;
			}
		};

		command.source_address = Some(ZigBeeAddress::Device(ZigBeeDeviceAddress::new(frame.source_address, frame.source_endpoint)));
		command.destination_address = Some(ZigBeeAddress::Device(ZigBeeDeviceAddress::new(frame.destination_address, frame.destination_endpoint)));

		debug!("rx command: {:?}", command);

		self.notify_command_listeners(&command);
		self.pending.command_received(&command);
	}

	fn set_network_state(&self, state: ZigBeeTransportState) {
		let listeners = self.state_listeners.snapshot();

		for listener in listeners.iter() {
			let listener = listener.clone();

			self.notification_service.execute(move || listener.network_state_updated(state));
		}
	}

	fn announce_device(&self, address: u16) {
		let listeners = self.announce_listeners.snapshot();

		for listener in listeners.iter() {
			let listener = listener.clone();

			self.notification_service.execute(move || listener.device_announced(address));
		}
	}
}

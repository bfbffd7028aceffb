//end to end scenarios against a mock transport

use std::sync::{ Arc, Mutex };
use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
use std::time::Duration;

use async_std::channel::{ unbounded, Receiver, Sender };
use async_std::future::timeout;

use zigbee::{
	transport, CommandListener, CommandPayload, CommandResult, DeviceAnnounceListener,
	IeeeAddress, NetworkState, NetworkStateSerializer, ZclCluster, ZclCommand, ZclCommandBody,
	ZigBeeAddress, ZigBeeApsFrame, ZigBeeCommand, ZigBeeDevice, ZigBeeDeviceAddress, ZigBeeGroup,
	ZigBeeInitializeResponse, ZigBeeKey, ZigBeeNetworkManager, ZigBeeNetworkNodeListener,
	ZigBeeNetworkParameters, ZigBeeNode, ZigBeeNodeType, ZigBeeNwkAddressMode,
	ZigBeeTransport, ZigBeeTransportReceive
};

struct MockTransport {
	channel: Mutex<u8>,
	pan_id: Mutex<u16>,
	extended_pan_id: Mutex<u64>,
	key: Mutex<Option<ZigBeeKey>>,
	frames: Mutex<Vec<ZigBeeApsFrame>>,
	receiver: Mutex<Option<Arc<dyn ZigBeeTransportReceive>>>,
	initialize_response: ZigBeeInitializeResponse,
	fail_send: AtomicBool
}

impl MockTransport {
	fn joined() -> Arc<Self> {
		Arc::new(MockTransport {
			channel: Mutex::new(15),
			pan_id: Mutex::new(0x1a62),
			extended_pan_id: Mutex::new(0),
			key: Mutex::new(None),
			frames: Mutex::new(Vec::new()),
			receiver: Mutex::new(None),
			initialize_response: ZigBeeInitializeResponse::Joined,
			fail_send: AtomicBool::new(false)
		})
	}

	fn frames(&self) -> Vec<ZigBeeApsFrame> {
		self.frames.lock().unwrap().clone()
	}

	fn last_frame(&self) -> ZigBeeApsFrame {
		self.frames.lock().unwrap().last().expect("no frame sent").clone()
	}

	fn inject(&self, frame: ZigBeeApsFrame) {
		let receiver = self.receiver.lock().unwrap().clone().expect("no receiver registered");

		receiver.receive_command(frame);
	}

	fn announce(&self, address: u16) {
		let receiver = self.receiver.lock().unwrap().clone().expect("no receiver registered");

		receiver.announce_device(address);
	}
}

impl ZigBeeTransport for MockTransport {
	fn initialize(&self) -> ZigBeeInitializeResponse {
		self.initialize_response
	}

	fn startup(&self, _reinitialize: bool) -> bool {
		true
	}

	fn shutdown(&self) {
	}

	fn get_channel(&self) -> u8 {
		*self.channel.lock().unwrap()
	}

	fn set_channel(&self, channel: u8) -> bool {
		*self.channel.lock().unwrap() = channel;

		true
	}

	fn get_pan_id(&self) -> u16 {
		*self.pan_id.lock().unwrap()
	}

	fn set_pan_id(&self, pan_id: u16) -> bool {
		*self.pan_id.lock().unwrap() = pan_id;

		true
	}

	fn get_extended_pan_id(&self) -> u64 {
		*self.extended_pan_id.lock().unwrap()
	}

	fn set_extended_pan_id(&self, extended_pan_id: u64) -> bool {
		*self.extended_pan_id.lock().unwrap() = extended_pan_id;

		true
	}

	fn set_security_key(&self, key: &ZigBeeKey) -> bool {
		*self.key.lock().unwrap() = Some(*key);

		true
	}

	fn send_command(&self, frame: ZigBeeApsFrame) -> Result<(), transport::Error> {
		if self.fail_send.load(Ordering::SeqCst) {
			return Err(transport::Error::Send("mock send failure".to_string()));
		}

		self.frames.lock().unwrap().push(frame);

		Ok(())
	}

	fn set_receiver(&self, receiver: Arc<dyn ZigBeeTransportReceive>) {
		*self.receiver.lock().unwrap() = Some(receiver);
	}
}

fn running_manager() -> (Arc<MockTransport>, Arc<ZigBeeNetworkManager>) {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	manager.initialize().unwrap();
	manager.startup(false).unwrap();

	(mock, manager)
}

async fn recv(rx: &Receiver<String>) -> String {
	timeout(Duration::from_secs(2), rx.recv()).await.expect("no event within 2s").unwrap()
}

async fn expect_silent(rx: &Receiver<String>) {
	assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err(), "unexpected event");
}

struct RecordingNodeListener {
	tx: Sender<String>
}

impl ZigBeeNetworkNodeListener for RecordingNodeListener {
	fn node_added(&self, node: &ZigBeeNode) {
		let _ = self.tx.try_send(format!("added:{:04x}", node.network_address));
	}

	fn node_updated(&self, node: &ZigBeeNode) {
		let _ = self.tx.try_send(format!("updated:{:04x}", node.network_address));
	}

	fn node_removed(&self, node: &ZigBeeNode) {
		let _ = self.tx.try_send(format!("removed:{:04x}", node.network_address));
	}
}

struct RecordingCommandListener {
	tx: Sender<String>
}

impl CommandListener for RecordingCommandListener {
	fn command_received(&self, command: &ZigBeeCommand) {
		let _ = self.tx.try_send(format!("cluster:{:04x}", command.cluster_id()));
	}
}

struct RecordingAnnounceListener {
	tx: Sender<String>
}

impl DeviceAnnounceListener for RecordingAnnounceListener {
	fn device_announced(&self, address: u16) {
		let _ = self.tx.try_send(format!("announce:{:04x}", address));
	}
}

struct CountingStateSerializer {
	saves: AtomicUsize
}

impl NetworkStateSerializer for CountingStateSerializer {
	fn deserialize(&self, _network: &ZigBeeNetworkManager) {
	}

	fn serialize(&self, _network: &ZigBeeNetworkManager) {
		self.saves.fetch_add(1, Ordering::SeqCst);
	}
}

#[test]
fn boot_join() {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	assert_eq!(manager.initialize().unwrap(), ZigBeeInitializeResponse::Joined);
	assert!(manager.startup(false).is_ok());
	assert_eq!(manager.get_channel(), 15);
}

#[test]
fn lifecycle_ordering_enforced() {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	//nothing is legal before initialize
	assert!(manager.set_channel(15).is_err());
	assert!(manager.startup(false).is_err());
	assert!(manager.shutdown().is_err());

	manager.initialize().unwrap();
	assert!(manager.initialize().is_err());
	assert!(manager.set_channel(15).is_ok());

	manager.startup(false).unwrap();
	assert_eq!(manager.state(), NetworkState::Running);

	//configuration is sealed once running
	assert!(manager.set_channel(15).is_err());

	assert!(manager.shutdown().is_ok());
	assert_eq!(manager.state(), NetworkState::Stopped);
	assert!(manager.shutdown().is_ok());
}

#[test]
fn channel_validation() {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	manager.initialize().unwrap();

	for channel in 0..=255u8 {
		let valid = (11..=26).contains(&channel);

		assert_eq!(manager.set_channel(channel).is_ok(), valid, "channel {}", channel);
	}
}

#[test]
fn pan_id_validation() {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	manager.initialize().unwrap();

	for pan_id in [0x0000, 0x0001, 0x1a62, 0x3fff, 0xffff] {
		assert!(manager.set_pan_id(pan_id).is_ok(), "pan id {:#06x}", pan_id);
	}

	for pan_id in [0x4000, 0x8000, 0xfffe] {
		assert!(manager.set_pan_id(pan_id).is_err(), "pan id {:#06x}", pan_id);
	}
}

#[test]
fn configure_applies_parameters() {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	manager.initialize().unwrap();

	let parameters = ZigBeeNetworkParameters {
		channel: 20,
		pan_id: 0x1234,
		extended_pan_id: [1, 2, 3, 4, 5, 6, 7, 8],
		key: [0x42; 16]
	};

	manager.configure(&parameters).unwrap();

	assert_eq!(manager.get_channel(), 20);
	assert_eq!(manager.get_pan_id(), 0x1234);
	assert_eq!(manager.get_extended_pan_id(), 0x0807060504030201);
	assert_eq!(*mock.key.lock().unwrap(), Some(ZigBeeKey([0x42; 16])));
}

#[test]
fn transaction_ids_allocate_sequentially() {
	let (mock, manager) = running_manager();

	for _ in 0..300 {
		manager.permit_join(60).unwrap();
	}

	let frames = mock.frames();
	let first = frames[0].sequence;

	for (i, frame) in frames.iter().enumerate() {
		assert_eq!(frame.sequence, first.wrapping_add(i as u8));
		assert_eq!(frame.aps_counter, frames[0].aps_counter.wrapping_add(i as u8));
	}
}

#[test]
fn permit_join_broadcast() {
	let (mock, manager) = running_manager();

	manager.permit_join(60).unwrap();

	let frame = mock.last_frame();

	assert_eq!(frame.profile, 0x0000);
	assert_eq!(frame.cluster, 0x0036);
	assert_eq!(frame.destination_address, 0xfffc);
	assert_eq!(frame.destination_endpoint, 0);
	assert_eq!(frame.radius, 31);
	assert_eq!(frame.payload, vec![frame.sequence, 60, 1]);
}

#[test]
fn permit_join_duration_clamped() {
	let (mock, manager) = running_manager();

	manager.permit_join(300).unwrap();

	let frame = mock.last_frame();

	assert_eq!(frame.payload[1], 255);

	manager.permit_join(0).unwrap();

	let frame = mock.last_frame();

	assert_eq!(frame.payload[1], 0);
}

#[test]
fn leave_request() {
	let (mock, manager) = running_manager();

	manager.leave(0x1234, IeeeAddress(0x00158d0001234567)).unwrap();

	let frame = mock.last_frame();

	assert_eq!(frame.profile, 0x0000);
	assert_eq!(frame.cluster, 0x0034);
	assert_eq!(frame.destination_address, 0x1234);

	let mut expected = vec![frame.sequence];

	expected.extend_from_slice(&0x00158d0001234567u64.to_le_bytes());
	expected.push(0);

	assert_eq!(frame.payload, expected);
}

#[async_std::test]
async fn read_attribute_round_trip() {
	let (mock, manager) = running_manager();

	let cluster = ZclCluster::new(ZigBeeDeviceAddress::new(0x1234, 1), 0x0006);
	let future = manager.read(&cluster, 0x0000);

	let frame = mock.last_frame();

	assert_eq!(frame.profile, 0x0104);
	assert_eq!(frame.cluster, 0x0006);
	assert_eq!(frame.destination_address, 0x1234);
	assert_eq!(frame.destination_endpoint, 1);

	//zcl header (entire profile, client to server), then read attributes 0x0000
	let tsn = frame.sequence;

	assert_eq!(frame.payload, vec![0x00, tsn, 0x00, 0x00, 0x00]);

	//reply with the same sequence number
	mock.inject(ZigBeeApsFrame {
		profile: 0x0104,
		cluster: 0x0006,
		source_address: 0x1234,
		source_endpoint: 1,
		destination_address: 0x0000,
		destination_endpoint: 1,
		payload: vec![0x08, tsn, 0x01, 0x00, 0x00, 0x00, 0x10, 0x01],
		..Default::default()
	});

	let result = timeout(Duration::from_secs(2), future).await.unwrap();
	let response = result.response().expect("expected a response");

	match &response.payload {
		CommandPayload::Zcl(zcl) => {
			assert_eq!(zcl.cluster_id, 0x0006);
			assert!(matches!(zcl.body, ZclCommandBody::Generic(_)));
		},
		other => panic!("unexpected payload: {:?}", other)
	}

	assert_eq!(response.transaction_id, Some(tsn));
}

#[async_std::test]
async fn mismatched_response_ignored() {
	let (mock, manager) = running_manager();

	let cluster = ZclCluster::new(ZigBeeDeviceAddress::new(0x1234, 1), 0x0006);
	let future = manager.read(&cluster, 0x0000);

	let tsn = mock.last_frame().sequence;

	//wrong sender, same sequence number
	mock.inject(ZigBeeApsFrame {
		profile: 0x0104,
		cluster: 0x0006,
		source_address: 0x9999,
		source_endpoint: 1,
		payload: vec![0x08, tsn, 0x01, 0x00, 0x00, 0x00, 0x10, 0x01],
		..Default::default()
	});

	//the future must still be pending
	assert!(timeout(Duration::from_millis(200), future).await.is_err());
}

#[async_std::test]
async fn broadcast_completes_immediately() {
	let (mock, manager) = running_manager();

	let command = ZclCommand::new(0x0006, ZclCommandBody::OnOff(zigbee::zcl::OnOffCommand::On));
	let result = timeout(Duration::from_secs(2), manager.send(ZigBeeAddress::Group(7), command)).await.unwrap();

	assert!(matches!(result, CommandResult::Broadcast));

	let frame = mock.last_frame();

	assert_eq!(frame.address_mode, ZigBeeNwkAddressMode::Group);
	assert_eq!(frame.destination_address, 7);
}

#[async_std::test]
async fn send_failure_surfaces_through_future() {
	let (mock, manager) = running_manager();

	mock.fail_send.store(true, Ordering::SeqCst);

	let cluster = ZclCluster::new(ZigBeeDeviceAddress::new(0x1234, 1), 0x0006);
	let result = timeout(Duration::from_secs(2), manager.read(&cluster, 0x0000)).await.unwrap();

	assert!(result.is_error());
}

#[async_std::test]
async fn node_add_remove_notifications() {
	let (_mock, manager) = running_manager();

	let (tx, rx) = unbounded();
	let listener = Arc::new(RecordingNodeListener {
		tx
	});

	manager.add_node_listener(listener);

	let node = ZigBeeNode::new(0x1234, IeeeAddress(0x1111));

	manager.add_node(node.clone());
	assert_eq!(recv(&rx).await, "added:1234");

	//adding a known node is a no-op
	manager.add_node(node.clone());

	//removing an unknown node fires nothing
	manager.remove_node(0x9999);

	manager.remove_node(0x1234);
	assert_eq!(recv(&rx).await, "removed:1234");

	assert!(manager.get_node(0x1234).is_none());
	expect_silent(&rx).await;
}

#[async_std::test]
async fn removed_listener_gets_no_further_events() {
	let (_mock, manager) = running_manager();

	let (tx_a, rx_a) = unbounded();
	let (tx_b, rx_b) = unbounded();

	let listener_a: Arc<dyn ZigBeeNetworkNodeListener> = Arc::new(RecordingNodeListener {
		tx: tx_a
	});
	let listener_b: Arc<dyn ZigBeeNetworkNodeListener> = Arc::new(RecordingNodeListener {
		tx: tx_b
	});

	manager.add_node_listener(listener_a.clone());
	manager.add_node_listener(listener_b);

	manager.add_node(ZigBeeNode::new(0x0001, IeeeAddress(1)));
	assert_eq!(recv(&rx_a).await, "added:0001");
	assert_eq!(recv(&rx_b).await, "added:0001");

	manager.remove_node_listener(&listener_a);

	manager.add_node(ZigBeeNode::new(0x0002, IeeeAddress(2)));
	assert_eq!(recv(&rx_b).await, "added:0002");

	assert!(rx_a.try_recv().is_err());
}

#[async_std::test]
async fn malformed_frames_dropped() {
	let (mock, manager) = running_manager();

	let (tx, rx) = unbounded();

	manager.add_command_listener(Arc::new(RecordingCommandListener {
		tx
	}));

	//unknown profile
	mock.inject(ZigBeeApsFrame {
		profile: 0x1234,
		cluster: 0x0006,
		payload: vec![0x00, 0x01, 0x02],
		..Default::default()
	});

	//zcl payload too short for a header
	mock.inject(ZigBeeApsFrame {
		profile: 0x0104,
		cluster: 0x0006,
		payload: vec![0x00],
		..Default::default()
	});

	//unknown zdo cluster
	mock.inject(ZigBeeApsFrame {
		profile: 0x0000,
		cluster: 0x0099,
		payload: vec![0x01, 0x00],
		..Default::default()
	});

	//a valid frame still flows after the drops
	mock.inject(ZigBeeApsFrame {
		profile: 0x0104,
		cluster: 0x0006,
		source_address: 0x1234,
		payload: vec![0x01, 0x07, 0x02],
		..Default::default()
	});

	assert_eq!(recv(&rx).await, "cluster:0006");
	expect_silent(&rx).await;
}

#[async_std::test]
async fn announce_listeners_notified() {
	let (mock, manager) = running_manager();

	let (tx, rx) = unbounded();

	manager.add_announce_listener(Arc::new(RecordingAnnounceListener {
		tx
	}));

	mock.announce(0x4471);

	assert_eq!(recv(&rx).await, "announce:4471");
}

#[async_std::test]
async fn device_announce_adds_node() {
	let (mock, manager) = running_manager();

	//device announce: nwk 0x4471, ieee, capability 0x8e (mains powered router)
	let mut payload = vec![0x05, 0x71, 0x44];

	payload.extend_from_slice(&0x00158d0001234567u64.to_le_bytes());
	payload.push(0x8e);

	mock.inject(ZigBeeApsFrame {
		profile: 0x0000,
		cluster: 0x0013,
		source_address: 0x4471,
		payload,
		..Default::default()
	});

	for _ in 0..100 {
		if let Some(node) = manager.get_node(0x4471) {
			assert_eq!(node.ieee_address, IeeeAddress(0x00158d0001234567));
			assert_eq!(node.node_type, ZigBeeNodeType::Router);

			return;
		}

		async_std::task::sleep(Duration::from_millis(20)).await;
	}

	panic!("node was never added from the device announce");
}

#[async_std::test]
async fn device_map_idempotence() {
	let (_mock, manager) = running_manager();

	let (tx, rx) = unbounded();

	struct RecordingDeviceListener {
		tx: Sender<String>
	}

	impl zigbee::ZigBeeNetworkDeviceListener for RecordingDeviceListener {
		fn device_added(&self, device: &ZigBeeDevice) {
			let _ = self.tx.try_send(format!("added:{}", device.device_address));
		}

		fn device_removed(&self, device: &ZigBeeDevice) {
			let _ = self.tx.try_send(format!("removed:{}", device.device_address));
		}
	}

	manager.add_device_listener(Arc::new(RecordingDeviceListener {
		tx
	}));

	let device = ZigBeeDevice::new(ZigBeeDeviceAddress::new(0x1234, 1), IeeeAddress(0x1111));

	manager.add_device(device.clone());
	assert_eq!(recv(&rx).await, "added:1234/1");

	manager.add_device(device.clone());
	manager.remove_device(ZigBeeDeviceAddress::new(0x9999, 1));

	manager.remove_device(device.device_address);
	assert_eq!(recv(&rx).await, "removed:1234/1");

	assert!(manager.get_device(device.device_address).is_none());
	expect_silent(&rx).await;
}

#[test]
fn group_membership() {
	let (_mock, manager) = running_manager();

	manager.add_membership(7, "kitchen");
	assert_eq!(manager.get_group(7).unwrap().label.as_deref(), Some("kitchen"));

	manager.add_membership(7, "hall");
	assert_eq!(manager.get_group(7).unwrap().label.as_deref(), Some("hall"));
	assert_eq!(manager.get_groups().len(), 1);

	manager.remove_membership(7);
	assert!(manager.get_group(7).is_none());
}

#[test]
fn bind_is_not_implemented() {
	let (_mock, manager) = running_manager();

	let a = ZigBeeDevice::new(ZigBeeDeviceAddress::new(1, 1), IeeeAddress(1));
	let b = ZigBeeDevice::new(ZigBeeDeviceAddress::new(2, 1), IeeeAddress(2));

	assert!(manager.bind(&a, &b, 0x0006).is_err());
	assert!(manager.unbind(&a, &b, 0x0006).is_err());
}

#[test]
fn mutations_trigger_persistence() {
	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());
	let serializer = Arc::new(CountingStateSerializer {
		saves: AtomicUsize::new(0)
	});

	manager.set_network_state_serializer(serializer.clone());

	manager.add_node(ZigBeeNode::new(1, IeeeAddress(1)));
	assert_eq!(serializer.saves.load(Ordering::SeqCst), 1);

	//no mutation, no save
	manager.add_node(ZigBeeNode::new(1, IeeeAddress(1)));
	assert_eq!(serializer.saves.load(Ordering::SeqCst), 1);

	manager.update_node(ZigBeeNode::new(1, IeeeAddress(2)));
	assert_eq!(serializer.saves.load(Ordering::SeqCst), 2);

	manager.remove_node(1);
	assert_eq!(serializer.saves.load(Ordering::SeqCst), 3);

	manager.add_membership(3, "garage");
	assert_eq!(serializer.saves.load(Ordering::SeqCst), 4);

	//shutdown persists once more
	manager.initialize().unwrap();
	manager.shutdown().unwrap();
	assert!(serializer.saves.load(Ordering::SeqCst) >= 5);
}

#[test]
fn state_restored_across_managers() {
	let path = std::env::temp_dir().join(format!("zigbee-state-{}.json", std::process::id()));

	let _ = std::fs::remove_file(&path);

	{
		let mock = MockTransport::joined();
		let manager = ZigBeeNetworkManager::new(mock.clone());

		manager.set_network_state_serializer(Arc::new(zigbee::FileNetworkStateSerializer::new(&path)));

		let mut node = ZigBeeNode::new(0x1234, IeeeAddress(0x00158d0001234567));

		node.node_type = ZigBeeNodeType::Router;
		manager.add_node(node);
		manager.add_device(ZigBeeDevice::new(ZigBeeDeviceAddress::new(0x1234, 1), IeeeAddress(0x00158d0001234567)));
		manager.add_group(ZigBeeGroup::new(9, Some("porch".to_string())));
	}

	let mock = MockTransport::joined();
	let manager = ZigBeeNetworkManager::new(mock.clone());

	manager.set_network_state_serializer(Arc::new(zigbee::FileNetworkStateSerializer::new(&path)));
	manager.initialize().unwrap();

	let node = manager.get_node(0x1234).expect("node not restored");

	assert_eq!(node.ieee_address, IeeeAddress(0x00158d0001234567));
	assert_eq!(node.node_type, ZigBeeNodeType::Router);
	assert!(manager.get_device(ZigBeeDeviceAddress::new(0x1234, 1)).is_some());
	assert_eq!(manager.get_group(9).unwrap().label.as_deref(), Some("porch"));

	let _ = std::fs::remove_file(&path);
}

//zigbee addressing and identity types

use serde::{ Serialize, Deserialize, Serializer, Deserializer, de };

//64 bit ieee address, formatted as 16 hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IeeeAddress(pub u64);

impl core::fmt::Display for IeeeAddress {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "{:016X}", self.0)
	}
}

impl Serialize for IeeeAddress {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format!("{:016x}", self.0))
	}
}

impl<'de> Deserialize<'de> for IeeeAddress {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;

		u64::from_str_radix(&s, 16).map(IeeeAddress).map_err(de::Error::custom)
	}
}

//16 bit network address qualified with an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZigBeeDeviceAddress {
	pub address: u16,
	pub endpoint: u8
}

impl ZigBeeDeviceAddress {
	pub fn new(address: u16, endpoint: u8) -> Self {
		ZigBeeDeviceAddress {
			address,
			endpoint
		}
	}

	pub fn broadcast(destination: ZigBeeBroadcastDestination) -> Self {
		ZigBeeDeviceAddress::new(destination as u16, 0)
	}
}

impl core::fmt::Display for ZigBeeDeviceAddress {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "{:04X}/{}", self.address, self.endpoint)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZigBeeAddress {
	Device(ZigBeeDeviceAddress),
	Group(u16)
}

impl ZigBeeAddress {
	pub fn is_group(&self) -> bool {
		matches!(self, Self::Group(_))
	}

	pub fn device(&self) -> Option<ZigBeeDeviceAddress> {
		match self {
			Self::Device(device) => Some(*device),
			Self::Group(_) => None
		}
	}

	//network address part, valid for device addresses only
	pub fn network_address(&self) -> Option<u16> {
		self.device().map(|d| d.address)
	}
}

impl From<ZigBeeDeviceAddress> for ZigBeeAddress {
	fn from(address: ZigBeeDeviceAddress) -> Self {
		ZigBeeAddress::Device(address)
	}
}

//well known broadcast destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ZigBeeBroadcastDestination {
	AllDevices = 0xffff,
	RxOnWhenIdle = 0xfffd,
	RoutersAndCoordinator = 0xfffc,
	LowPowerRouters = 0xfffb
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ieee_address_format() {
		assert_eq!(IeeeAddress(0x00158d0001234567).to_string(), "00158D0001234567");
	}

	#[test]
	fn ieee_address_serde() {
		let addr = IeeeAddress(0x00158d0001234567);
		let json = serde_json::to_string(&addr).unwrap();

		assert_eq!(json, "\"00158d0001234567\"");
		assert_eq!(serde_json::from_str::<IeeeAddress>(&json).unwrap(), addr);
	}

	#[test]
	fn group_detection() {
		assert!(ZigBeeAddress::Group(5).is_group());
		assert!(!ZigBeeAddress::Device(ZigBeeDeviceAddress::new(0x1234, 1)).is_group());
		assert_eq!(ZigBeeAddress::Device(ZigBeeDeviceAddress::new(0x1234, 1)).network_address(), Some(0x1234));
		assert_eq!(ZigBeeAddress::Group(5).network_address(), None);
	}

	#[test]
	fn broadcast_destination() {
		let addr = ZigBeeDeviceAddress::broadcast(ZigBeeBroadcastDestination::RoutersAndCoordinator);

		assert_eq!(addr.address, 0xfffc);
		assert_eq!(addr.endpoint, 0);
	}
}

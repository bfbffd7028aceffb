//per frame serializer construction
//a fresh serializer pair is built for every frame, no state crosses frames

use serialization::{ ZigBeeSerializer, ZigBeeDeserializer, DefaultSerializer, DefaultDeserializer };

pub type SerializerFactory = Box<dyn Fn() -> Result<Box<dyn ZigBeeSerializer>, serialization::Error> + Send + Sync>;
pub type DeserializerFactory = Box<dyn Fn(Vec<u8>) -> Result<Box<dyn ZigBeeDeserializer>, serialization::Error> + Send + Sync>;

pub struct Codec {
	serializer: SerializerFactory,
	deserializer: DeserializerFactory
}

impl Codec {
	pub fn new(serializer: SerializerFactory, deserializer: DeserializerFactory) -> Self {
		Codec {
			serializer,
			deserializer
		}
	}

	pub fn new_serializer(&self) -> Result<Box<dyn ZigBeeSerializer>, serialization::Error> {
		(self.serializer)()
	}

	pub fn new_deserializer(&self, payload: Vec<u8>) -> Result<Box<dyn ZigBeeDeserializer>, serialization::Error> {
		(self.deserializer)(payload)
	}
}

impl Default for Codec {
	fn default() -> Self {
		Codec {
			serializer: Box::new(|| Ok(Box::new(DefaultSerializer::new()))),
			deserializer: Box::new(|payload| Ok(Box::new(DefaultDeserializer::new(payload))))
		}
	}
}

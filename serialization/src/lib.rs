pub mod serialization;
pub use serialization::{ Error, ZigBeeSerializer, ZigBeeDeserializer, DefaultSerializer, DefaultDeserializer };

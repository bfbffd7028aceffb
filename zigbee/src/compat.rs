pub mod channel {
	pub use async_std::channel::{ Sender, Receiver, unbounded, SendError, RecvError };
}

pub mod task {
	pub use async_std::task::{ spawn, sleep, block_on };
}

//serialized listener notification off the inbound frame path

use std::panic::{ catch_unwind, AssertUnwindSafe };
use std::sync::{ Arc, Mutex };
use tracing::{ debug, warn };

use crate::compat::{ channel::{ unbounded, Sender }, task };

type Notification = Box<dyn FnOnce() + Send>;

//one worker task drains the queue, so callbacks run in submission order
//and never under a model lock
pub struct NotificationService {
	tx: Sender<Notification>
}

impl NotificationService {
	pub fn new() -> Self {
		let (tx, rx) = unbounded::<Notification>();

		task::spawn(async move {
			while let Ok(notification) = rx.recv().await {
				if catch_unwind(AssertUnwindSafe(notification)).is_err() {
					warn!("listener panicked during notification");
				}
			}
		});

		NotificationService {
			tx
		}
	}

	pub fn execute(&self, notification: impl FnOnce() + Send + 'static) {
		if self.tx.try_send(Box::new(notification)).is_err() {
			debug!("notification executor gone, notification dropped");
		}
	}
}

impl Default for NotificationService {
	fn default() -> Self {
		Self::new()
	}
}

//copy on write listener list; notification iterates a snapshot, so a
//mutation during dispatch never affects the in-flight event
pub struct ListenerList<T: ?Sized> {
	listeners: Mutex<Arc<Vec<Arc<T>>>>
}

impl<T: ?Sized> ListenerList<T> {
	pub fn new() -> Self {
		ListenerList {
			listeners: Mutex::new(Arc::new(Vec::new()))
		}
	}

	pub fn add(&self, listener: Arc<T>) {
		let mut current = self.listeners.lock().unwrap();
		let mut modified = current.as_ref().clone();

		modified.push(listener);
		*current = Arc::new(modified);
	}

	pub fn remove(&self, listener: &Arc<T>) {
		let mut current = self.listeners.lock().unwrap();
		let mut modified = current.as_ref().clone();

		modified.retain(|l| !same_listener(l, listener));
		*current = Arc::new(modified);
	}

	pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
		self.listeners.lock().unwrap().clone()
	}
}

impl<T: ?Sized> Default for ListenerList<T> {
	fn default() -> Self {
		Self::new()
	}
}

//compare data pointers only; vtable pointers are not stable across codegen units
fn same_listener<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
	Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

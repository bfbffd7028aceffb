//single assignment command futures and the pending request queue

use core::future::Future;
use std::pin::Pin;
use std::sync::{ Arc, Mutex };
use std::task::{ Context, Poll, Waker };
use std::time::{ Duration, Instant };

use crate::command::{ CommandMatcher, CommandResult, ZigBeeCommand };

pub const TRANSACTION_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug)]
pub(crate) struct CommandFutureState {
	//set by the send path once the transaction id is final; matching
	//locks this state, so a response can never race the send
	pub(crate) request: Option<ZigBeeCommand>,
	pub(crate) result: Option<CommandResult>,
	pub(crate) waker: Option<Waker>,
	pub(crate) start: Instant
}

//awaitable outcome of a request
pub struct CommandFuture {
	state: Arc<Mutex<CommandFutureState>>
}

impl CommandFuture {
	pub(crate) fn new() -> (Self, Arc<Mutex<CommandFutureState>>) {
		let state = Arc::new(Mutex::new(CommandFutureState {
			request: None,
			result: None,
			waker: None,
			start: Instant::now()
		}));

		(CommandFuture { state: state.clone() }, state)
	}

	pub(crate) fn completed(result: CommandResult) -> Self {
		let (future, state) = Self::new();

		state.lock().unwrap().result = Some(result);

		future
	}
}

impl Future for CommandFuture {
	type Output = CommandResult;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<CommandResult> {
		let mut state = self.state.lock().unwrap();

		if let Some(result) = state.result.take() {
			Poll::Ready(result)
		}
		else {
			state.waker = Some(cx.waker().clone());

			Poll::Pending
		}
	}
}

//completion takes the state lock exactly once, then wakes outside of it
pub(crate) fn complete(state: &Arc<Mutex<CommandFutureState>>, result: CommandResult) {
	let waker = {
		let mut state = state.lock().unwrap();

		if state.result.is_some() {
			return;
		}

		state.result = Some(result);
		state.waker.take()
	};

	if let Some(waker) = waker {
		waker.wake();
	}
}

struct PendingEntry {
	state: Arc<Mutex<CommandFutureState>>,
	matcher: Arc<dyn CommandMatcher>
}

//in-flight requests; entries leave on match, send failure or expiry
pub(crate) struct PendingQueue {
	entries: Mutex<Vec<PendingEntry>>,
	timeout: Duration
}

impl PendingQueue {
	pub(crate) fn new() -> Self {
		Self::with_timeout(TRANSACTION_TIMEOUT)
	}

	pub(crate) fn with_timeout(timeout: Duration) -> Self {
		PendingQueue {
			entries: Mutex::new(Vec::new()),
			timeout
		}
	}

	//adding sweeps expired entries first
	pub(crate) fn add(&self, state: Arc<Mutex<CommandFutureState>>, matcher: Arc<dyn CommandMatcher>) {
		let mut entries = self.entries.lock().unwrap();

		Self::expire(&mut entries, self.timeout);
		entries.push(PendingEntry {
			state,
			matcher
		});
	}

	pub(crate) fn remove(&self, state: &Arc<Mutex<CommandFutureState>>) {
		self.entries.lock().unwrap().retain(|e| !Arc::ptr_eq(&e.state, state));
	}

	pub(crate) fn sweep(&self) {
		let mut entries = self.entries.lock().unwrap();

		Self::expire(&mut entries, self.timeout);
	}

	fn expire(entries: &mut Vec<PendingEntry>, timeout: Duration) {
		let mut expired = Vec::new();

		entries.retain(|e| {
			if e.state.lock().unwrap().start.elapsed() > timeout {
				expired.push(e.state.clone());

				false
			}
			else {
				true
			}
		});

		for state in expired {
			complete(&state, CommandResult::None);
		}
	}

	//match an inbound command against the pending requests
	pub(crate) fn command_received(&self, received: &ZigBeeCommand) {
		let matched = {
			let mut entries = self.entries.lock().unwrap();
			let mut matched = Vec::new();

			entries.retain(|e| {
				let state = e.state.lock().unwrap();

				let hit = match &state.request {
					Some(request) => e.matcher.is_match(request, received),
					None => false
				};

				if hit {
					matched.push(e.state.clone());
				}

				!hit
			});

			matched
		};

		for state in matched {
			complete(&state, CommandResult::Received(received.clone()));
		}
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.entries.lock().unwrap().len()
	}
}

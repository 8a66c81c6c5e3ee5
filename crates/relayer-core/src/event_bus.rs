//! Broadcast channel for execution progress.

use relayer_types::ExecutionEvent;
use tokio::sync::broadcast;

/// Fan-out of [`ExecutionEvent`]s to any number of subscribers.
///
/// Publishing never blocks; slow subscribers lose the oldest events once
/// the channel capacity is exceeded.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Receives every event published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
		self.sender.subscribe()
	}

	/// Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: ExecutionEvent,
	) -> Result<(), broadcast::error::SendError<ExecutionEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(256)
	}
}

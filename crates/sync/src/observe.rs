//! Listener registration for state-change notifications.
//!
//! Controllers emit explicit change events instead of relying on any
//! framework's implicit re-render scheduling. Embedders subscribe a callback
//! and re-read the controller's model when it fires.

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A registry of change listeners for one event type.
pub struct Listeners<T> {
	next_id: u64,
	entries: Vec<(SubscriptionId, Box<dyn Fn(&T) + Send>)>,
}

impl<T> Default for Listeners<T> {
	fn default() -> Self {
		Self {
			next_id: 0,
			entries: Vec::new(),
		}
	}
}

impl<T> std::fmt::Debug for Listeners<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Listeners")
			.field("len", &self.entries.len())
			.finish()
	}
}

impl<T> Listeners<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a listener and returns its subscription handle.
	pub fn subscribe(&mut self, listener: impl Fn(&T) + Send + 'static) -> SubscriptionId {
		self.next_id += 1;
		let id = SubscriptionId(self.next_id);
		self.entries.push((id, Box::new(listener)));
		id
	}

	/// Removes a listener. Returns false when the handle is unknown.
	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.entries.len();
		self.entries.retain(|(sid, _)| *sid != id);
		self.entries.len() != before
	}

	/// Invokes every registered listener with `value`.
	pub fn emit(&self, value: &T) {
		for (_, listener) in &self.entries {
			listener(value);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

//! Entity form controller: load, edit, validate, save.
//!
//! Composes the [`FormSyncController`] state machine with an
//! [`EntityStore`]. Navigation resets the session synchronously and then
//! fires a background load; a late payload for a previously requested entity
//! is rejected twice over (navigation generation tag, then the payload's own
//! identifier check in the state machine). Saves go through local validation
//! first, and on success the baseline becomes the store's canonical echo.

use std::sync::Arc;

use folio_sync::fetch::FetchError;
use folio_sync::form::{
	EntityId, EntityPayload, FieldMap, FieldValue, FormPhase, FormSyncController, InitOutcome,
};
use folio_sync::observe::{Listeners, SubscriptionId};
use tokio::sync::mpsc;

use crate::capability::EntityStore;
use crate::error::{FormError, ValidationError};

/// Change notification emitted to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
	/// Baseline established; the form is editable.
	Initialized,
	/// The entity load failed.
	LoadFailed,
	/// Save succeeded; the baseline is the canonical echo.
	Saved,
	/// Save failed; edits and baseline are untouched.
	SaveFailed,
}

/// Declarative read model for the form view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormModel<'a> {
	pub values: &'a FieldMap,
	pub is_dirty: bool,
	pub is_initialized: bool,
	/// Set when the last load for the current entity failed.
	pub load_error: Option<&'a FetchError>,
}

/// Controller for one entity-bound form.
pub struct FormController {
	store: Arc<dyn EntityStore>,
	sync: FormSyncController,
	payload_tx: mpsc::UnboundedSender<(u64, Result<EntityPayload, FetchError>)>,
	payload_rx: mpsc::UnboundedReceiver<(u64, Result<EntityPayload, FetchError>)>,
	load_error: Option<FetchError>,
	/// Field names that must hold non-blank text before a save is submitted.
	required: Vec<String>,
	listeners: Listeners<FormEvent>,
}

impl std::fmt::Debug for FormController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormController")
			.field("sync", &self.sync)
			.field("required", &self.required)
			.finish_non_exhaustive()
	}
}

impl FormController {
	pub fn new(store: Arc<dyn EntityStore>, required: Vec<String>) -> Self {
		let (payload_tx, payload_rx) = mpsc::unbounded_channel();
		Self {
			store,
			sync: FormSyncController::new(),
			payload_tx,
			payload_rx,
			load_error: None,
			required,
			listeners: Listeners::new(),
		}
	}

	/// Switches to entity `id` and starts loading it.
	///
	/// The session reset happens synchronously, before this method returns
	/// and before any pending or future load can resolve.
	pub fn navigate(&mut self, id: EntityId) {
		self.sync.navigate(id);
		self.load_error = None;

		let generation = self.sync.nav_generation();
		let store = Arc::clone(&self.store);
		let tx = self.payload_tx.clone();
		tokio::spawn(async move {
			let result = store.load(id).await;
			let _ = tx.send((generation, result));
		});
	}

	/// Applies every already-delivered load result. Returns the number of
	/// results applied (discarded stale ones included).
	pub fn apply_ready(&mut self) -> usize {
		let mut applied = 0;
		while let Ok((generation, result)) = self.payload_rx.try_recv() {
			self.apply_result(generation, result);
			applied += 1;
		}
		applied
	}

	/// Waits for the next load result and applies it.
	pub async fn wait_event(&mut self) {
		if let Some((generation, result)) = self.payload_rx.recv().await {
			self.apply_result(generation, result);
		}
	}

	fn apply_result(&mut self, generation: u64, result: Result<EntityPayload, FetchError>) {
		if generation != self.sync.nav_generation() {
			tracing::debug!(generation, "form.load.stale_discard");
			return;
		}
		match result {
			Ok(payload) => match self.sync.on_payload(payload) {
				InitOutcome::Initialized => self.listeners.emit(&FormEvent::Initialized),
				InitOutcome::WrongEntity
				| InitOutcome::AlreadyInitialized
				| InitOutcome::NoneRequested => {}
			},
			Err(err) => {
				tracing::warn!(error = %err, "form.load.failed");
				self.load_error = Some(err);
				self.listeners.emit(&FormEvent::LoadFailed);
			}
		}
	}

	/// Sets one editable field value.
	pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
		self.sync.set_field(name, value);
	}

	/// Validates and persists the current form values.
	///
	/// Validation failures never reach the store. On success the baseline and
	/// values become the store's canonical echo and the session reads clean
	/// immediately; on failure everything is left as it was.
	pub async fn save(&mut self) -> Result<(), FormError> {
		let FormPhase::Initialized(id) = self.sync.phase() else {
			return Err(FormError::NotInitialized);
		};
		for name in &self.required {
			let blank = match self.sync.values().get(name) {
				Some(FieldValue::Text(text)) => text.trim().is_empty(),
				_ => true,
			};
			if blank {
				return Err(ValidationError::BlankField(name.clone()).into());
			}
		}

		match self.store.save(id, self.sync.values()).await {
			Ok(canonical) => {
				self.sync.apply_save(canonical);
				self.listeners.emit(&FormEvent::Saved);
				Ok(())
			}
			Err(err) => {
				tracing::warn!(entity = id.0, error = %err, "form.save.failed");
				self.listeners.emit(&FormEvent::SaveFailed);
				Err(err.into())
			}
		}
	}

	/// Snapshot of the current read model.
	pub fn model(&self) -> FormModel<'_> {
		FormModel {
			values: self.sync.values(),
			is_dirty: self.sync.is_dirty(),
			is_initialized: self.sync.is_initialized(),
			load_error: self.load_error.as_ref(),
		}
	}

	/// Registers a change listener.
	pub fn subscribe(&mut self, listener: impl Fn(&FormEvent) + Send + 'static) -> SubscriptionId {
		self.listeners.subscribe(listener)
	}

	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		self.listeners.unsubscribe(id)
	}
}

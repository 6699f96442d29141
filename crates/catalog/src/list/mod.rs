//! Searchable, paginated list controller.
//!
//! Owns the search and page state for one list view and wires the sync
//! primitives together: keystrokes feed the debouncer; a settled value
//! updates the persisted filters (resetting the page in the same update),
//! then starts a keyed fetch; the stale guard decides what the read model
//! shows. All transitions run to completion before the next event is
//! applied; suspension happens only inside [`ListController::wait_event`].

use std::sync::Arc;
use std::time::Duration;

use folio_sync::debounce::{DEFAULT_QUIET, Debouncer};
use folio_sync::fetch::{FetchCoordinator, FetchKey, FetchOutcome, PageFetcher, ScopeId};
use folio_sync::observe::{Listeners, SubscriptionId};
use folio_sync::query::{self, FilterStore, QueryUpdate};
use folio_sync::stale::{ResolveAction, StaleGuard};

use crate::entity::ListKind;

/// Change notification emitted to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
	/// The debounced search value settled and a fetch was issued.
	SearchSettled,
	/// The page changed and a fetch was issued.
	PageChanged,
	/// Authoritative data arrived; the model is displayable.
	Fetched,
	/// The current key's fetch failed; the model carries the error flag.
	FetchFailed,
}

/// Declarative read model for one list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListModel<'a, T> {
	/// Raw input as typed, before debouncing.
	pub raw_input: &'a str,
	/// The settled search the view is (or will be) showing.
	pub search: &'a str,
	pub page: u32,
	pub page_size: u32,
	/// Present only while displayable; `None` renders as loading.
	pub items: Option<&'a [T]>,
	pub total: u64,
	pub total_pages: u32,
	pub is_loading: bool,
	pub is_error: bool,
}

/// Controller for one searchable, paginated list view.
pub struct ListController<T> {
	scope: ScopeId,
	page_size: u32,
	raw_input: String,
	debounced: String,
	page: u32,
	debouncer: Debouncer,
	debounce_rx: tokio::sync::mpsc::UnboundedReceiver<String>,
	coordinator: FetchCoordinator<T>,
	outcome_rx: tokio::sync::mpsc::UnboundedReceiver<FetchOutcome<T>>,
	guard: StaleGuard<T>,
	filters: Box<dyn FilterStore + Send>,
	listeners: Listeners<ListEvent>,
}

impl<T> std::fmt::Debug for ListController<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListController")
			.field("scope", &self.scope)
			.field("search", &self.debounced)
			.field("page", &self.page)
			.finish_non_exhaustive()
	}
}

impl<T: Send + 'static> ListController<T> {
	/// Creates a controller, restoring search/page from the filter store and
	/// issuing the initial fetch.
	pub fn new(
		scope: ScopeId,
		page_size: u32,
		quiet: Duration,
		fetcher: Arc<dyn PageFetcher<T>>,
		filters: Box<dyn FilterStore + Send>,
	) -> Self {
		let restored = query::read_query(&*filters);
		let (debouncer, debounce_rx) = Debouncer::new(quiet);
		let (coordinator, outcome_rx) = FetchCoordinator::new(fetcher);
		let mut controller = Self {
			scope,
			page_size,
			raw_input: restored.search.clone(),
			debounced: restored.search.clone(),
			page: restored.page,
			debouncer,
			debounce_rx,
			coordinator,
			outcome_rx,
			guard: StaleGuard::new(),
			filters,
			listeners: Listeners::new(),
		};
		controller.guard.on_debounce_settle(&restored.search);
		controller.start_fetch();
		controller
	}

	/// Creates a controller for one of the catalog's list views with its
	/// fixed page size and the default quiet period.
	pub fn for_kind(
		kind: ListKind,
		fetcher: Arc<dyn PageFetcher<T>>,
		filters: Box<dyn FilterStore + Send>,
	) -> Self {
		Self::new(kind.scope(), kind.page_size(), DEFAULT_QUIET, fetcher, filters)
	}

	/// Records one keystroke. The settled value arrives via the event pump.
	pub fn set_search_input(&mut self, text: &str) {
		text.clone_into(&mut self.raw_input);
		self.debouncer.input(text);
	}

	/// Jumps to page `n` (clamped to 1) and refetches. The search is left
	/// untouched.
	pub fn set_page(&mut self, n: u32) {
		let n = n.max(1);
		if n == self.page {
			return;
		}
		self.page = n;
		query::apply_update(&mut *self.filters, QueryUpdate::Page(n));
		self.start_fetch();
		self.listeners.emit(&ListEvent::PageChanged);
	}

	/// Re-issues the current key. This is the user-initiated retry after a
	/// failure; there is no automatic one.
	pub fn refresh(&mut self) {
		self.start_fetch();
	}

	/// Applies every already-delivered event without blocking. Returns the
	/// number of events applied.
	pub fn apply_ready(&mut self) -> usize {
		let mut applied = 0;
		while let Ok(value) = self.debounce_rx.try_recv() {
			self.on_settled(value);
			applied += 1;
		}
		while let Ok(outcome) = self.outcome_rx.try_recv() {
			self.on_outcome(outcome);
			applied += 1;
		}
		applied
	}

	/// Waits for the next event (debounce settle or fetch outcome) and
	/// applies it.
	pub async fn wait_event(&mut self) {
		tokio::select! {
			Some(value) = self.debounce_rx.recv() => self.on_settled(value),
			Some(outcome) = self.outcome_rx.recv() => self.on_outcome(outcome),
			else => {}
		}
	}

	/// Snapshot of the current read model.
	pub fn model(&self) -> ListModel<'_, T> {
		let is_error = self.guard.is_error();
		let items = self.guard.rows();
		let total = self.guard.total();
		ListModel {
			raw_input: &self.raw_input,
			search: &self.debounced,
			page: self.page,
			page_size: self.page_size,
			items,
			total,
			total_pages: total.div_ceil(u64::from(self.page_size)) as u32,
			is_loading: items.is_none() && !is_error,
			is_error,
		}
	}

	/// Registers a change listener.
	pub fn subscribe(&mut self, listener: impl Fn(&ListEvent) + Send + 'static) -> SubscriptionId {
		self.listeners.subscribe(listener)
	}

	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		self.listeners.unsubscribe(id)
	}

	/// Cancels the pending debounce timer. In-flight fetches are allowed to
	/// finish; their outcomes are simply never applied.
	pub fn dispose(&mut self) {
		self.debouncer.dispose();
	}

	fn current_key(&self) -> FetchKey {
		FetchKey {
			scope: self.scope,
			search: self.debounced.clone(),
			page: self.page,
			page_size: self.page_size,
		}
	}

	fn start_fetch(&mut self) {
		let key = self.current_key();
		let seq = self.coordinator.start(key.clone());
		self.guard.on_fetch_start(key, seq);
	}

	fn on_settled(&mut self, value: String) {
		if value == self.debounced {
			return;
		}
		tracing::debug!(scope = self.scope.0, search = %value, "list.search.settled");
		self.debounced = value.clone();
		self.page = 1;
		query::apply_update(&mut *self.filters, QueryUpdate::Search(value.clone()));
		self.guard.on_debounce_settle(&value);
		self.start_fetch();
		self.listeners.emit(&ListEvent::SearchSettled);
	}

	fn on_outcome(&mut self, outcome: FetchOutcome<T>) {
		let seq = outcome.seq;
		match self.guard.on_fetch_resolve(outcome) {
			ResolveAction::Confirmed => {
				self.listeners.emit(&ListEvent::Fetched);
			}
			ResolveAction::Failed => {
				tracing::warn!(scope = self.scope.0, seq, "list.fetch.failed");
				self.listeners.emit(&ListEvent::FetchFailed);
			}
			ResolveAction::Held => {
				tracing::debug!(scope = self.scope.0, seq, "list.fetch.held");
			}
			ResolveAction::StaleSeq | ResolveAction::KeyMismatch => {
				tracing::debug!(scope = self.scope.0, seq, "list.fetch.stale_discard");
				// A discard can complete the picture for the retained
				// newest response; surface that to subscribers.
				if self.guard.displayable() {
					self.listeners.emit(&ListEvent::Fetched);
				}
			}
		}
	}
}

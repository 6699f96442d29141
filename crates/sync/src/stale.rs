//! Display gating for possibly-stale response data.
//!
//! A fetch layer may satisfy an older in-flight key from a cache faster than
//! the newest key's round trip, so responses can arrive out of order. The
//! guard is a pure synchronous state machine: responses are applied by key
//! match, never by arrival order, and its verdict is re-evaluated on every
//! transition (debounce settle, fetch start, fetch resolve). No timers, no
//! tasks; correctness holds from the transitions alone.
//!
//! The confirmed search value advances to the debounced value only when a
//! successful response for the current key has the highest sequence yet
//! observed and no fetch for a different key is still pending. Whenever the
//! guard is not displayable the view renders a loading state, never
//! previously held rows — showing old rows under a new, unconfirmed search
//! term is the defect this guard exists to prevent.

use rustc_hash::FxHashMap;

use crate::fetch::{FetchError, FetchKey, FetchOutcome, FetchPage};

/// What the guard did with one resolved outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
	/// Success applied; the response is now the authoritative display data.
	Confirmed,
	/// Failure for the current key; the error flag is raised.
	Failed,
	/// Success retained but not yet authoritative (the debounced search
	/// moved on, or an older fetch for a different key is still pending).
	Held,
	/// Discarded: a response with a higher sequence number already resolved.
	StaleSeq,
	/// Discarded: the response answers a key that is no longer current.
	KeyMismatch,
}

/// Latest response retained for the current key.
#[derive(Debug, Clone)]
struct LatestResponse<T> {
	key: FetchKey,
	result: Result<FetchPage<T>, FetchError>,
}

/// Decides, at any instant, whether held response data is safe to display.
#[derive(Debug, Clone)]
pub struct StaleGuard<T> {
	debounced: String,
	current_key: Option<FetchKey>,
	/// Sequence numbers of fetches started but not yet resolved, with the
	/// key each one answers.
	pending: FxHashMap<u64, FetchKey>,
	/// Highest sequence number among resolved outcomes.
	highest_seq: u64,
	/// Last search value for which display was authoritative.
	confirmed: Option<String>,
	latest: Option<LatestResponse<T>>,
}

impl<T> Default for StaleGuard<T> {
	fn default() -> Self {
		Self {
			debounced: String::new(),
			current_key: None,
			pending: FxHashMap::default(),
			highest_seq: 0,
			confirmed: None,
			latest: None,
		}
	}
}

impl<T> StaleGuard<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a settled debounce value.
	pub fn on_debounce_settle(&mut self, value: &str) {
		if self.debounced != value {
			value.clone_into(&mut self.debounced);
		}
		self.reevaluate();
	}

	/// Records a fetch start for `key` with sequence `seq`.
	///
	/// A retained failure is dropped here: the re-issued fetch is the user's
	/// retry, and until it resolves the state is loading, not error.
	pub fn on_fetch_start(&mut self, key: FetchKey, seq: u64) {
		if self.latest.as_ref().is_some_and(|l| l.result.is_err()) {
			self.latest = None;
		}
		self.pending.insert(seq, key.clone());
		self.current_key = Some(key);
		self.reevaluate();
	}

	/// Applies one resolved outcome by key match.
	pub fn on_fetch_resolve(&mut self, outcome: FetchOutcome<T>) -> ResolveAction {
		self.pending.remove(&outcome.seq);

		if outcome.seq < self.highest_seq {
			self.reevaluate();
			return ResolveAction::StaleSeq;
		}
		self.highest_seq = outcome.seq;

		if self.current_key.as_ref() != Some(&outcome.key) {
			self.reevaluate();
			return ResolveAction::KeyMismatch;
		}

		let failed = outcome.result.is_err();
		self.latest = Some(LatestResponse {
			key: outcome.key,
			result: outcome.result,
		});
		self.reevaluate();

		if failed {
			ResolveAction::Failed
		} else if self.displayable() {
			ResolveAction::Confirmed
		} else {
			ResolveAction::Held
		}
	}

	/// Advances the confirmed search when every condition holds at once: a
	/// retained success answers the current key, that key's search equals the
	/// debounced value, and nothing is pending for a different key.
	fn reevaluate(&mut self) {
		let (Some(latest), Some(current)) = (&self.latest, &self.current_key) else {
			return;
		};
		if latest.key != *current || latest.result.is_err() {
			return;
		}
		if latest.key.search != self.debounced {
			return;
		}
		if self.pending.values().any(|key| key != current) {
			return;
		}
		self.confirmed = Some(self.debounced.clone());
	}

	/// True when the held rows are safe to display for the current query.
	pub fn displayable(&self) -> bool {
		let (Some(latest), Some(current)) = (&self.latest, &self.current_key) else {
			return false;
		};
		latest.key == *current
			&& latest.result.is_ok()
			&& self.confirmed.as_deref() == Some(self.debounced.as_str())
	}

	/// True when the last response for the current key was a failure.
	pub fn is_error(&self) -> bool {
		match (&self.latest, &self.current_key) {
			(Some(latest), Some(current)) => latest.key == *current && latest.result.is_err(),
			_ => false,
		}
	}

	/// The authoritative rows, present only while displayable.
	pub fn rows(&self) -> Option<&[T]> {
		if !self.displayable() {
			return None;
		}
		match &self.latest {
			Some(LatestResponse {
				result: Ok(page), ..
			}) => Some(&page.items),
			_ => None,
		}
	}

	/// Total item count from the authoritative response, 0 while loading.
	pub fn total(&self) -> u64 {
		if !self.displayable() {
			return 0;
		}
		match &self.latest {
			Some(LatestResponse {
				result: Ok(page), ..
			}) => page.total,
			_ => 0,
		}
	}

	/// Last search value for which display was authoritative.
	pub fn confirmed(&self) -> Option<&str> {
		self.confirmed.as_deref()
	}

	/// Number of fetches started but not yet resolved.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fetch::ScopeId;

	fn key(search: &str, page: u32) -> FetchKey {
		FetchKey {
			scope: ScopeId(1),
			search: search.to_owned(),
			page,
			page_size: 50,
		}
	}

	fn page(items: &[&str]) -> FetchPage<String> {
		FetchPage {
			items: items.iter().map(|s| (*s).to_owned()).collect(),
			total: items.len() as u64,
		}
	}

	fn ok(key: FetchKey, seq: u64, items: &[&str]) -> FetchOutcome<String> {
		FetchOutcome {
			key,
			seq,
			result: Ok(page(items)),
		}
	}

	#[test]
	fn initial_state_is_loading() {
		let guard: StaleGuard<String> = StaleGuard::new();
		assert!(!guard.displayable());
		assert!(!guard.is_error());
		assert_eq!(guard.rows(), None);
	}

	#[test]
	fn single_fetch_confirms() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("dune");
		guard.on_fetch_start(key("dune", 1), 1);
		assert!(!guard.displayable());

		let action = guard.on_fetch_resolve(ok(key("dune", 1), 1, &["Dune"]));
		assert_eq!(action, ResolveAction::Confirmed);
		assert!(guard.displayable());
		assert_eq!(guard.rows().map(<[String]>::len), Some(1));
		assert_eq!(guard.confirmed(), Some("dune"));
	}

	#[test]
	fn out_of_order_arrival_applies_newest_key() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("dan");
		guard.on_fetch_start(key("dan", 1), 1);
		guard.on_debounce_settle("dune");
		guard.on_fetch_start(key("dune", 1), 2);

		// B (newest key) resolves first; held back while A is still pending.
		let action = guard.on_fetch_resolve(ok(key("dune", 1), 2, &["Dune"]));
		assert_eq!(action, ResolveAction::Held);
		assert!(!guard.displayable());

		// A arrives late and is discarded; B's retained response confirms.
		let action = guard.on_fetch_resolve(ok(key("dan", 1), 1, &["Dan Simmons"]));
		assert_eq!(action, ResolveAction::StaleSeq);
		assert!(guard.displayable());
		assert_eq!(guard.rows().map(|r| r[0].as_str()), Some("Dune"));
	}

	#[test]
	fn superseded_search_never_displays() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("dan");
		guard.on_fetch_start(key("dan", 1), 1);
		guard.on_debounce_settle("dune");
		guard.on_fetch_start(key("dune", 1), 2);

		// A's response for the superseded key arrives first, in order.
		let action = guard.on_fetch_resolve(ok(key("dan", 1), 1, &["Dan Simmons"]));
		assert_eq!(action, ResolveAction::KeyMismatch);
		assert!(!guard.displayable());
		assert_eq!(guard.rows(), None);

		let action = guard.on_fetch_resolve(ok(key("dune", 1), 2, &["Dune"]));
		assert_eq!(action, ResolveAction::Confirmed);
		assert_eq!(guard.rows().map(|r| r[0].as_str()), Some("Dune"));
	}

	#[test]
	fn settle_after_confirm_hides_rows_until_reconfirmed() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("dan");
		guard.on_fetch_start(key("dan", 1), 1);
		guard.on_fetch_resolve(ok(key("dan", 1), 1, &["Dan Simmons"]));
		assert!(guard.displayable());

		// New settled value: confirmed != debounced, so loading again.
		guard.on_debounce_settle("dune");
		assert!(!guard.displayable());
		assert_eq!(guard.rows(), None);
	}

	#[test]
	fn page_change_hides_old_page_rows() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("");
		guard.on_fetch_start(key("", 1), 1);
		guard.on_fetch_resolve(ok(key("", 1), 1, &["row1"]));
		assert!(guard.displayable());

		guard.on_fetch_start(key("", 2), 2);
		assert!(!guard.displayable());

		guard.on_fetch_resolve(ok(key("", 2), 2, &["row2"]));
		assert!(guard.displayable());
		assert_eq!(guard.rows().map(|r| r[0].as_str()), Some("row2"));
	}

	#[test]
	fn error_raises_flag_and_blocks_display() {
		let mut guard: StaleGuard<String> = StaleGuard::new();
		guard.on_debounce_settle("dune");
		guard.on_fetch_start(key("dune", 1), 1);
		let action = guard.on_fetch_resolve(FetchOutcome {
			key: key("dune", 1),
			seq: 1,
			result: Err(FetchError::Transport("boom".into())),
		});
		assert_eq!(action, ResolveAction::Failed);
		assert!(guard.is_error());
		assert!(!guard.displayable());

		// User-initiated re-fetch for the same key recovers.
		guard.on_fetch_start(key("dune", 1), 2);
		assert!(!guard.is_error());
		guard.on_fetch_resolve(ok(key("dune", 1), 2, &["Dune"]));
		assert!(guard.displayable());
	}

	#[test]
	fn refetch_of_same_key_keeps_rows_displayable() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("dune");
		guard.on_fetch_start(key("dune", 1), 1);
		guard.on_fetch_resolve(ok(key("dune", 1), 1, &["Dune"]));

		// Same query re-issued: the held response still answers it.
		guard.on_fetch_start(key("dune", 1), 2);
		assert!(guard.displayable());
	}

	#[test]
	fn stale_error_for_old_key_is_discarded() {
		let mut guard = StaleGuard::new();
		guard.on_debounce_settle("dan");
		guard.on_fetch_start(key("dan", 1), 1);
		guard.on_debounce_settle("dune");
		guard.on_fetch_start(key("dune", 1), 2);
		guard.on_fetch_resolve(ok(key("dune", 1), 2, &["Dune"]));

		let action = guard.on_fetch_resolve(FetchOutcome::<String> {
			key: key("dan", 1),
			seq: 1,
			result: Err(FetchError::Transport("boom".into())),
		});
		assert_eq!(action, ResolveAction::StaleSeq);
		assert!(!guard.is_error());
		assert!(guard.displayable());
	}
}

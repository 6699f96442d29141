//! Persisted filter state: a pure serialize/parse pair over a string-keyed
//! store.
//!
//! The shareable representation has exactly one encoding per logical state:
//! an empty search and page 1 are expressed by *absence* of their keys, never
//! by an empty string or `"1"`. Any search write resets the page in the same
//! update, so no observer of the store can see a page that is stale relative
//! to the search.

use rustc_hash::FxHashMap;

/// Key under which the settled search text is persisted.
pub const SEARCH_KEY: &str = "search";

/// Key under which the 1-based page number is persisted.
pub const PAGE_KEY: &str = "page";

/// A string-keyed persisted key-value surface (URL query, session store, ...).
///
/// Implementations only need get/set/remove; all canonicalization lives in
/// [`read_query`] and [`apply_update`].
pub trait FilterStore {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&mut self, key: &str, value: &str);
	fn remove(&mut self, key: &str);
}

/// In-memory [`FilterStore`] for tests and embeddings without a URL bar.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilterStore {
	entries: FxHashMap<String, String>,
}

impl MemoryFilterStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of keys currently present.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl FilterStore for MemoryFilterStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.get(key).cloned()
	}

	fn set(&mut self, key: &str, value: &str) {
		self.entries.insert(key.to_owned(), value.to_owned());
	}

	fn remove(&mut self, key: &str) {
		self.entries.remove(key);
	}
}

/// In-memory filter state parsed from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
	pub search: String,
	pub page: u32,
}

/// A single logical update to the persisted filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryUpdate {
	/// New settled search text. Always resets the page to 1.
	Search(String),
	/// New page number; the search is left untouched.
	Page(u32),
}

/// Parses the persisted filter state, applying defaults.
///
/// A missing, non-numeric, or non-positive page parses as 1; a missing search
/// parses as the empty string.
pub fn read_query(store: &dyn FilterStore) -> QueryState {
	let search = store.get(SEARCH_KEY).unwrap_or_default();
	let page = match store.get(PAGE_KEY) {
		None => 1,
		Some(raw) => match raw.parse::<u32>() {
			Ok(n) if n >= 1 => n,
			_ => {
				tracing::debug!(raw = %raw, "query.page.invalid");
				1
			}
		},
	};
	QueryState { search, page }
}

/// Applies one logical update, keeping the canonical single representation.
///
/// Search writes and the implied page reset land in the same call, so the
/// store never holds an intermediate state.
pub fn apply_update(store: &mut dyn FilterStore, update: QueryUpdate) {
	match update {
		QueryUpdate::Search(search) => {
			if search.is_empty() {
				store.remove(SEARCH_KEY);
			} else {
				store.set(SEARCH_KEY, &search);
			}
			store.remove(PAGE_KEY);
		}
		QueryUpdate::Page(page) => {
			if page <= 1 {
				store.remove(PAGE_KEY);
			} else {
				store.set(PAGE_KEY, &page.to_string());
			}
		}
	}
}

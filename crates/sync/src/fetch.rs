//! Keyed asynchronous fetches with per-scope sequence numbering.
//!
//! The coordinator tags every request with the [`FetchKey`] it answers and a
//! monotone sequence number, then delivers the outcome on a channel. It never
//! aborts an outstanding transport call when a newer key is issued; the old
//! call is allowed to finish and its outcome is discarded downstream by the
//! [`crate::stale::StaleGuard`]. All failures, including a panicking
//! transport task, surface through the outcome's result; nothing here throws
//! synchronously.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identity dimension partitioning which fetch keys are comparable (one list
/// view, one entity editor, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u64);

/// Identity of one request. Two fetches are "the same query" iff all four
/// fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
	pub scope: ScopeId,
	pub search: String,
	pub page: u32,
	pub page_size: u32,
}

/// One page of results for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPage<T> {
	pub items: Vec<T>,
	pub total: u64,
}

/// Errors surfaced by the fetch layer.
///
/// There is no automatic retry on any of these; retry is a user-initiated
/// re-invocation (new search, page change, or revisit).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
	/// The transport call failed.
	#[error("transport failure: {0}")]
	Transport(String),
	/// The fetch task itself failed (panic or cancellation at the join
	/// boundary).
	#[error("fetch task failed: {0}")]
	TaskFailed(String),
}

/// Transport seam for page fetches (mockable in tests).
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
	async fn fetch_page(&self, key: &FetchKey) -> Result<FetchPage<T>, FetchError>;
}

/// The answer to one keyed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome<T> {
	pub key: FetchKey,
	pub seq: u64,
	pub result: Result<FetchPage<T>, FetchError>,
}

/// Monotonic sequence clock for fetches within one scope.
#[derive(Debug, Default, Clone)]
pub struct SeqClock {
	next: Arc<AtomicU64>,
}

impl SeqClock {
	/// Creates a clock starting at sequence 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next sequence number.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Issues keyed fetches and delivers tagged outcomes.
pub struct FetchCoordinator<T> {
	fetcher: Arc<dyn PageFetcher<T>>,
	clock: SeqClock,
	tx: mpsc::UnboundedSender<FetchOutcome<T>>,
}

impl<T> std::fmt::Debug for FetchCoordinator<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FetchCoordinator")
			.field("clock", &self.clock)
			.finish_non_exhaustive()
	}
}

impl<T: Send + 'static> FetchCoordinator<T> {
	/// Creates a coordinator and the receiver for its outcomes.
	pub fn new(fetcher: Arc<dyn PageFetcher<T>>) -> (Self, mpsc::UnboundedReceiver<FetchOutcome<T>>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(
			Self {
				fetcher,
				clock: SeqClock::new(),
				tx,
			},
			rx,
		)
	}

	/// Starts one fetch for `key` and returns its sequence number.
	///
	/// Outstanding fetches for older keys are not aborted; their outcomes
	/// arrive with lower sequence numbers and older keys, and are discarded
	/// for display by the stale guard.
	pub fn start(&self, key: FetchKey) -> u64 {
		let seq = self.clock.next();
		tracing::debug!(
			seq,
			scope = key.scope.0,
			search = %key.search,
			page = key.page,
			"fetch.start"
		);

		let fetcher = Arc::clone(&self.fetcher);
		let task_key = key.clone();
		let task = tokio::spawn(async move { fetcher.fetch_page(&task_key).await });

		let tx = self.tx.clone();
		tokio::spawn(async move {
			let result = match task.await {
				Ok(result) => result,
				Err(err) => {
					tracing::warn!(seq, error = %err, "fetch.task_failed");
					Err(FetchError::TaskFailed(err.to_string()))
				}
			};
			let _ = tx.send(FetchOutcome { key, seq, result });
		});
		seq
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct StaticFetcher {
		result: Result<FetchPage<&'static str>, FetchError>,
	}

	#[async_trait]
	impl PageFetcher<&'static str> for StaticFetcher {
		async fn fetch_page(
			&self,
			_key: &FetchKey,
		) -> Result<FetchPage<&'static str>, FetchError> {
			self.result.clone()
		}
	}

	struct PanickingFetcher;

	#[async_trait]
	impl PageFetcher<&'static str> for PanickingFetcher {
		async fn fetch_page(
			&self,
			_key: &FetchKey,
		) -> Result<FetchPage<&'static str>, FetchError> {
			panic!("transport blew up");
		}
	}

	fn key(search: &str, page: u32) -> FetchKey {
		FetchKey {
			scope: ScopeId(1),
			search: search.to_owned(),
			page,
			page_size: 50,
		}
	}

	#[tokio::test]
	async fn outcome_carries_key_and_seq() {
		let fetcher = Arc::new(StaticFetcher {
			result: Ok(FetchPage {
				items: vec!["dune"],
				total: 1,
			}),
		});
		let (coordinator, mut rx) = FetchCoordinator::new(fetcher);

		let seq = coordinator.start(key("dune", 1));
		let outcome = rx.recv().await.expect("outcome");
		assert_eq!(outcome.seq, seq);
		assert_eq!(outcome.key, key("dune", 1));
		assert_eq!(
			outcome.result.expect("page").items,
			vec!["dune"]
		);
	}

	#[tokio::test]
	async fn sequence_numbers_are_monotone() {
		let fetcher = Arc::new(StaticFetcher {
			result: Ok(FetchPage {
				items: vec![],
				total: 0,
			}),
		});
		let (coordinator, mut rx) = FetchCoordinator::new(fetcher);

		let first = coordinator.start(key("a", 1));
		let second = coordinator.start(key("b", 1));
		assert!(second > first);

		let mut seqs = vec![
			rx.recv().await.expect("first").seq,
			rx.recv().await.expect("second").seq,
		];
		seqs.sort_unstable();
		assert_eq!(seqs, vec![first, second]);
	}

	#[tokio::test]
	async fn transport_error_surfaces_in_outcome() {
		let fetcher = Arc::new(StaticFetcher {
			result: Err(FetchError::Transport("boom".into())),
		});
		let (coordinator, mut rx) = FetchCoordinator::new(fetcher);

		coordinator.start(key("dune", 1));
		let outcome = rx.recv().await.expect("outcome");
		assert_eq!(outcome.result, Err(FetchError::Transport("boom".into())));
	}

	#[tokio::test]
	async fn panicking_transport_becomes_error_outcome() {
		let fetcher = Arc::new(PanickingFetcher);
		let (coordinator, mut rx) = FetchCoordinator::new(fetcher);

		coordinator.start(key("dune", 1));
		let outcome = rx.recv().await.expect("outcome");
		assert!(matches!(outcome.result, Err(FetchError::TaskFailed(_))));
	}
}

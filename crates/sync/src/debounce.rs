//! Input debouncing with hard timer cancellation.
//!
//! Each call to [`Debouncer::input`] cancels the previous pending timer and
//! arms a new one for the quiet period. Only a timer that survives the full
//! quiet period emits, and nothing ever emits after [`Debouncer::dispose`].
//! Timer cancellation is hard (the sleep task is cancelled), unlike fetch
//! supersession, which lets the transport call finish and discards the
//! result downstream.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default quiet period between the last keystroke and the settled emission.
pub const DEFAULT_QUIET: Duration = Duration::from_millis(300);

/// Collapses rapid input events into a single settled value per quiet
/// interval.
///
/// Settled values are delivered on the receiver handed out by
/// [`Debouncer::new`]. At most one timer is pending at any instant.
#[derive(Debug)]
pub struct Debouncer {
	quiet: Duration,
	/// Generation of the newest input; a timer only emits if it still holds
	/// the latest generation when it fires. Closes the race where a timer
	/// task is already past its cancellation check.
	latest: Arc<AtomicU64>,
	pending: Option<CancellationToken>,
	tx: mpsc::UnboundedSender<String>,
	disposed: bool,
}

impl Debouncer {
	/// Creates a debouncer and the receiver for settled values.
	pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(
			Self {
				quiet,
				latest: Arc::new(AtomicU64::new(0)),
				pending: None,
				tx,
				disposed: false,
			},
			rx,
		)
	}

	/// Records one user edit, superseding any pending timer.
	pub fn input(&mut self, raw: impl Into<String>) {
		if self.disposed {
			return;
		}
		let raw = raw.into();

		if let Some(token) = self.pending.take() {
			token.cancel();
		}
		let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;

		let token = CancellationToken::new();
		self.pending = Some(token.clone());

		let latest = Arc::clone(&self.latest);
		let tx = self.tx.clone();
		let quiet = self.quiet;
		tokio::spawn(async move {
			tokio::select! {
				_ = token.cancelled() => {}
				_ = tokio::time::sleep(quiet) => {
					if latest.load(Ordering::Acquire) == generation {
						let _ = tx.send(raw);
					}
				}
			}
		});
	}

	/// Returns true while a timer is armed.
	pub fn has_pending(&self) -> bool {
		self.pending
			.as_ref()
			.is_some_and(|token| !token.is_cancelled())
	}

	/// Cancels any pending timer with no emission. Further inputs are ignored.
	pub fn dispose(&mut self) {
		if let Some(token) = self.pending.take() {
			token.cancel();
		}
		self.latest.fetch_add(1, Ordering::AcqRel);
		self.disposed = true;
	}
}

impl Drop for Debouncer {
	fn drop(&mut self) {
		self.dispose();
	}
}

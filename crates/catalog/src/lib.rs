#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Catalog browsing and administration controllers.
//!
//! Thin domain layer over [`folio_sync`]: list views (imprints, tags,
//! series, people, books) and entity forms compose the debouncer, keyed
//! fetch coordinator, stale guard, and form baseline state machine into
//! declarative read models for a UI.
//!
//! # Main Types
//!
//! - [`list::ListController`] - searchable, paginated list view state
//! - [`form::FormController`] - entity form with baseline/dirty tracking
//! - [`capability::EntityStore`] - load/save seam with canonical echo
//! - [`entity::ListKind`] - the catalog's list views and their page sizes
//!
//! Rendering, routing, transport, and authentication are the embedding
//! application's concern; everything here is driven through explicit
//! actions (`set_search_input`, `set_page`, `navigate`, `save`) and an
//! event pump (`apply_ready` / `wait_event`).

pub mod capability;
pub mod entity;
pub mod error;
pub mod form;
pub mod list;

pub use capability::EntityStore;
pub use entity::{BookRow, LibrarySettings, ListKind, NamedRow};
pub use error::{FetchError, FormError, SaveError, ValidationError};
pub use form::{FormController, FormEvent, FormModel};
pub use list::{ListController, ListEvent, ListModel};

//! Per-entity form baseline state machine and dirty evaluation.
//!
//! [`FormSyncController`] owns the baseline/values pair for exactly one
//! entity-edit session. The baseline initializes at most once per entity
//! occupancy, and only from a payload whose own identifier matches the
//! requested entity — the identifier check in the transition guard is what
//! closes the race where a late (possibly cache-satisfied) response for a
//! previously active entity would otherwise be misread as the new entity's
//! data.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --payload(id == requested)--> Initialized(id)
//! Initialized(a) --navigate(b != a)--> Uninitialized   (synchronous)
//! ```
//!
//! On a successful save the baseline is replaced by the *canonical* values
//! echoed by the store, never by the raw pre-save form values; raw input
//! diverges byte-for-byte from what the backend normalized, which would leave
//! the dirty flag stuck on.

use std::collections::BTreeMap;

use crate::structural;

/// Identifier of an editable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Canonical value of one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
	Text(String),
	Flag(bool),
	Count(i64),
	TextList(Vec<String>),
}

/// Field name → value, ordered for stable iteration.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A fetched entity: its own identifier plus its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPayload {
	pub id: EntityId,
	pub fields: FieldMap,
}

/// Current phase of the edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
	/// No baseline yet; dirty evaluation is inactive.
	Uninitialized,
	/// Baseline established for this entity.
	Initialized(EntityId),
}

/// What [`FormSyncController::on_payload`] did with one fetched payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
	/// Baseline established from this payload.
	Initialized,
	/// Baseline for this entity already exists; payload ignored.
	AlreadyInitialized,
	/// Payload identifies a different entity than the one requested.
	WrongEntity,
	/// No entity is currently requested.
	NoneRequested,
}

/// Owns the baseline/values pair for one entity-edit session.
#[derive(Debug, Clone, Default)]
pub struct FormSyncController {
	requested: Option<EntityId>,
	phase: Option<EntityId>,
	nav_generation: u64,
	baseline: FieldMap,
	values: FieldMap,
}

impl FormSyncController {
	pub fn new() -> Self {
		Self::default()
	}

	/// Switches the session to `id`.
	///
	/// Runs synchronously: the phase is forced back to uninitialized and the
	/// baseline/values discarded *before* any pending or future fetch can
	/// resolve. A no-op when `id` is already the requested entity.
	pub fn navigate(&mut self, id: EntityId) {
		if self.requested == Some(id) {
			return;
		}
		self.requested = Some(id);
		self.phase = None;
		self.nav_generation = self.nav_generation.wrapping_add(1);
		self.baseline.clear();
		self.values.clear();
		tracing::debug!(entity = id.0, generation = self.nav_generation, "form.navigate");
	}

	/// Offers a fetched payload for baseline initialization.
	///
	/// The transition fires only when the payload's own identifier equals the
	/// requested entity and no baseline exists yet for it.
	pub fn on_payload(&mut self, payload: EntityPayload) -> InitOutcome {
		let Some(requested) = self.requested else {
			return InitOutcome::NoneRequested;
		};
		if payload.id != requested {
			tracing::warn!(
				requested = requested.0,
				got = payload.id.0,
				"form.init.wrong_entity"
			);
			return InitOutcome::WrongEntity;
		}
		if self.phase == Some(requested) {
			return InitOutcome::AlreadyInitialized;
		}
		self.values = payload.fields.clone();
		self.baseline = payload.fields;
		self.phase = Some(requested);
		tracing::debug!(entity = requested.0, "form.init");
		InitOutcome::Initialized
	}

	/// Sets one editable field value.
	pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
		self.values.insert(name.into(), value);
	}

	/// Replaces the baseline with the store's canonical echo after a
	/// successful save.
	///
	/// Form values are set to the same canonical map, so the session reads as
	/// clean immediately, without a refetch. Call only on save success; on
	/// failure both baseline and values are left exactly as they were.
	pub fn apply_save(&mut self, canonical: FieldMap) {
		if self.phase.is_none() {
			return;
		}
		self.values = canonical.clone();
		self.baseline = canonical;
		tracing::debug!("form.baseline.replaced");
	}

	pub fn phase(&self) -> FormPhase {
		match self.phase {
			Some(id) => FormPhase::Initialized(id),
			None => FormPhase::Uninitialized,
		}
	}

	pub fn is_initialized(&self) -> bool {
		self.phase.is_some()
	}

	/// The entity this session is initialized for, if any.
	pub fn entity(&self) -> Option<EntityId> {
		self.phase
	}

	/// Bumped on every entity change; tags in-flight loads so late responses
	/// for a previous session are identifiable.
	pub fn nav_generation(&self) -> u64 {
		self.nav_generation
	}

	pub fn values(&self) -> &FieldMap {
		&self.values
	}

	pub fn baseline(&self) -> &FieldMap {
		&self.baseline
	}

	/// True when any field structurally differs from the baseline.
	///
	/// Always false before initialization.
	pub fn is_dirty(&self) -> bool {
		self.phase.is_some() && fields_differ(&self.values, &self.baseline)
	}
}

/// Structural comparison of two field values.
///
/// Scalars compare by exact value; lists element-wise and order-sensitive,
/// never by storage identity.
pub fn field_values_equal(a: &FieldValue, b: &FieldValue) -> bool {
	match (a, b) {
		(FieldValue::TextList(x), FieldValue::TextList(y)) => structural::sequences_equal(x, y),
		_ => a == b,
	}
}

/// True when the two maps differ in any field, by name or value.
pub fn fields_differ(values: &FieldMap, baseline: &FieldMap) -> bool {
	if values.len() != baseline.len() {
		return true;
	}
	values.iter().any(|(name, value)| {
		baseline
			.get(name)
			.is_none_or(|base| !field_values_equal(value, base))
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn fields(name: &str, paths: &[&str]) -> FieldMap {
		FieldMap::from([
			("name".to_owned(), FieldValue::Text(name.to_owned())),
			(
				"library_paths".to_owned(),
				FieldValue::TextList(paths.iter().map(|s| (*s).to_owned()).collect()),
			),
		])
	}

	#[test]
	fn starts_uninitialized() {
		let form = FormSyncController::new();
		assert_eq!(form.phase(), FormPhase::Uninitialized);
		assert!(!form.is_dirty());
	}

	#[test]
	fn initializes_only_from_matching_identifier() {
		let mut form = FormSyncController::new();
		form.navigate(EntityId(2));

		// A cached response for entity 1 resolves first.
		let stale = EntityPayload {
			id: EntityId(1),
			fields: fields("Library One", &[]),
		};
		assert_eq!(form.on_payload(stale), InitOutcome::WrongEntity);
		assert_eq!(form.phase(), FormPhase::Uninitialized);

		let fresh = EntityPayload {
			id: EntityId(2),
			fields: fields("Library Two", &[]),
		};
		assert_eq!(form.on_payload(fresh), InitOutcome::Initialized);
		assert_eq!(form.phase(), FormPhase::Initialized(EntityId(2)));
	}

	#[test]
	fn initializes_at_most_once_per_entity() {
		let mut form = FormSyncController::new();
		form.navigate(EntityId(1));
		form.on_payload(EntityPayload {
			id: EntityId(1),
			fields: fields("Library One", &[]),
		});
		form.set_field("name", FieldValue::Text("Edited".into()));

		// A duplicate payload must not clobber in-progress edits.
		let outcome = form.on_payload(EntityPayload {
			id: EntityId(1),
			fields: fields("Library One", &[]),
		});
		assert_eq!(outcome, InitOutcome::AlreadyInitialized);
		assert_eq!(
			form.values().get("name"),
			Some(&FieldValue::Text("Edited".into()))
		);
		assert!(form.is_dirty());
	}

	#[test]
	fn navigation_resets_synchronously() {
		let mut form = FormSyncController::new();
		form.navigate(EntityId(1));
		let generation = form.nav_generation();
		form.on_payload(EntityPayload {
			id: EntityId(1),
			fields: fields("Library One", &[]),
		});
		assert!(form.is_initialized());

		form.navigate(EntityId(2));
		assert_eq!(form.phase(), FormPhase::Uninitialized);
		assert!(form.values().is_empty());
		assert!(form.baseline().is_empty());
		assert_ne!(form.nav_generation(), generation);
	}

	#[test]
	fn renavigating_to_same_entity_is_a_noop() {
		let mut form = FormSyncController::new();
		form.navigate(EntityId(1));
		form.on_payload(EntityPayload {
			id: EntityId(1),
			fields: fields("Library One", &[]),
		});
		let generation = form.nav_generation();

		form.navigate(EntityId(1));
		assert!(form.is_initialized());
		assert_eq!(form.nav_generation(), generation);
	}

	#[test]
	fn dirty_tracks_scalar_and_list_fields() {
		let mut form = FormSyncController::new();
		form.navigate(EntityId(1));
		form.on_payload(EntityPayload {
			id: EntityId(1),
			fields: fields("Test Library", &["/path1", "/path2"]),
		});
		assert!(!form.is_dirty());

		form.set_field("name", FieldValue::Text("Other".into()));
		assert!(form.is_dirty());
		form.set_field("name", FieldValue::Text("Test Library".into()));
		assert!(!form.is_dirty());

		// Same elements, different order: dirty.
		form.set_field(
			"library_paths",
			FieldValue::TextList(vec!["/path2".into(), "/path1".into()]),
		);
		assert!(form.is_dirty());

		// Same elements, same order, freshly allocated storage: clean.
		form.set_field(
			"library_paths",
			FieldValue::TextList(vec!["/path1".into(), "/path2".into()]),
		);
		assert!(!form.is_dirty());
	}

	#[test]
	fn apply_save_installs_canonical_baseline() {
		let mut form = FormSyncController::new();
		form.navigate(EntityId(1));
		form.on_payload(EntityPayload {
			id: EntityId(1),
			fields: fields("Old", &[]),
		});
		form.set_field("name", FieldValue::Text("  Test Library  ".into()));
		form.set_field(
			"library_paths",
			FieldValue::TextList(vec![
				"/path1".into(),
				String::new(),
				"  ".into(),
				"/path2".into(),
			]),
		);
		assert!(form.is_dirty());

		form.apply_save(fields("Test Library", &["/path1", "/path2"]));
		assert!(!form.is_dirty());
		assert_eq!(form.baseline(), &fields("Test Library", &["/path1", "/path2"]));

		// Any further edit is dirty against the canonical baseline.
		form.set_field("name", FieldValue::Text("Test Library 2".into()));
		assert!(form.is_dirty());
	}

	#[test]
	fn missing_or_extra_fields_are_dirty() {
		let baseline = fields("A", &[]);
		let mut fewer = baseline.clone();
		fewer.remove("name");
		assert!(fields_differ(&fewer, &baseline));

		let mut more = baseline.clone();
		more.insert("extra".into(), FieldValue::Flag(true));
		assert!(fields_differ(&more, &baseline));
		assert!(!fields_differ(&baseline.clone(), &baseline));
	}
}

//! Catalog domain types and field canonicalization.

use folio_sync::fetch::ScopeId;
use folio_sync::form::{FieldMap, FieldValue};
use serde::{Deserialize, Serialize};

/// The browsable list views of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
	Imprints,
	Tags,
	Series,
	People,
	Books,
}

impl ListKind {
	pub const ALL: [ListKind; 5] = [
		ListKind::Imprints,
		ListKind::Tags,
		ListKind::Series,
		ListKind::People,
		ListKind::Books,
	];

	/// Fixed page size for this list type.
	pub const fn page_size(self) -> u32 {
		match self {
			// Book rows render covers, so the grid page is smaller.
			ListKind::Books => 18,
			_ => 50,
		}
	}

	/// Fetch scope partitioning this list's keys from every other view.
	pub const fn scope(self) -> ScopeId {
		ScopeId(match self {
			ListKind::Imprints => 1,
			ListKind::Tags => 2,
			ListKind::Series => 3,
			ListKind::People => 4,
			ListKind::Books => 5,
		})
	}
}

/// Row of the imprints, tags, series, and people lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRow {
	pub id: u64,
	pub name: String,
	pub book_count: u64,
}

/// Row of the books list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRow {
	pub id: u64,
	pub title: String,
	pub authors: Vec<String>,
	pub series: Option<String>,
	pub tags: Vec<String>,
}

/// Field name of the settings form's library name.
pub const FIELD_NAME: &str = "name";

/// Field name of the settings form's library path list.
pub const FIELD_LIBRARY_PATHS: &str = "library_paths";

/// The editable library settings entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibrarySettings {
	pub name: String,
	pub library_paths: Vec<String>,
}

impl LibrarySettings {
	/// Projects the settings into the form field map.
	pub fn to_fields(&self) -> FieldMap {
		FieldMap::from([
			(
				FIELD_NAME.to_owned(),
				FieldValue::Text(self.name.clone()),
			),
			(
				FIELD_LIBRARY_PATHS.to_owned(),
				FieldValue::TextList(self.library_paths.clone()),
			),
		])
	}

	/// Reads settings back from a form field map, if the shapes match.
	pub fn from_fields(fields: &FieldMap) -> Option<Self> {
		let FieldValue::Text(name) = fields.get(FIELD_NAME)? else {
			return None;
		};
		let FieldValue::TextList(paths) = fields.get(FIELD_LIBRARY_PATHS)? else {
			return None;
		};
		Some(Self {
			name: name.clone(),
			library_paths: paths.clone(),
		})
	}
}

/// Canonical form of a text field: surrounding whitespace trimmed.
pub fn canonical_text(raw: &str) -> String {
	raw.trim().to_owned()
}

/// Canonical form of a string list: entries trimmed, blanks dropped, order
/// preserved.
pub fn canonical_list(raw: &[String]) -> Vec<String> {
	raw.iter()
		.map(|entry| entry.trim())
		.filter(|entry| !entry.is_empty())
		.map(str::to_owned)
		.collect()
}

/// Applies the store-side normalization to a whole field map. This is what a
/// conforming [`crate::capability::EntityStore`] echoes back from `save`.
pub fn canonicalize_fields(fields: &FieldMap) -> FieldMap {
	fields
		.iter()
		.map(|(name, value)| {
			let canonical = match value {
				FieldValue::Text(text) => FieldValue::Text(canonical_text(text)),
				FieldValue::TextList(items) => FieldValue::TextList(canonical_list(items)),
				other => other.clone(),
			};
			(name.clone(), canonical)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scopes_are_distinct() {
		let mut scopes: Vec<u64> = ListKind::ALL.iter().map(|k| k.scope().0).collect();
		scopes.sort_unstable();
		scopes.dedup();
		assert_eq!(scopes.len(), ListKind::ALL.len());
	}

	#[test]
	fn settings_field_roundtrip() {
		let settings = LibrarySettings {
			name: "Test Library".into(),
			library_paths: vec!["/path1".into(), "/path2".into()],
		};
		assert_eq!(
			LibrarySettings::from_fields(&settings.to_fields()),
			Some(settings)
		);
	}

	#[test]
	fn canonicalize_trims_and_filters() {
		let raw = LibrarySettings {
			name: "  Test Library  ".into(),
			library_paths: vec!["/path1".into(), String::new(), "  ".into(), "/path2".into()],
		};
		let canonical = canonicalize_fields(&raw.to_fields());
		assert_eq!(
			LibrarySettings::from_fields(&canonical),
			Some(LibrarySettings {
				name: "Test Library".into(),
				library_paths: vec!["/path1".into(), "/path2".into()],
			})
		);
	}

	#[test]
	fn canonicalize_preserves_scalars() {
		let fields = FieldMap::from([("flag".to_owned(), FieldValue::Flag(true))]);
		assert_eq!(canonicalize_fields(&fields), fields);
	}
}

//! Order-sensitive structural equality for sequence-valued fields.

/// Compares two sequences element-wise, in order.
///
/// Two sequences with the same elements in the same order compare equal no
/// matter where they are stored; sequences of different length or order never
/// do. Used by the dirty evaluator for list-valued form fields.
pub fn sequences_equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
	a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn equal_content_distinct_storage() {
		let a = vec!["/path1".to_owned(), "/path2".to_owned()];
		let b: Vec<String> = a.iter().map(|s| s.clone() + "").collect();
		assert!(sequences_equal(&a, &b));
	}

	#[test]
	fn order_sensitive() {
		let a = ["x", "y"];
		let b = ["y", "x"];
		assert!(!sequences_equal(&a, &b));
	}

	#[test]
	fn length_mismatch() {
		assert!(!sequences_equal(&[1, 2, 3], &[1, 2]));
		assert!(sequences_equal::<u8>(&[], &[]));
	}
}

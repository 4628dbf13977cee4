use std::ops::Range;

/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for every document offset the
/// runtime stores.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// Returns true if `inner` lies within `outer`, both ends inclusive.
///
/// A cursor sitting right after the last character of `outer` is still
/// considered inside it.
pub fn contains(outer: &Range<CharIdx>, inner: &Range<CharIdx>) -> bool {
	let (start, end) = ordered(inner);
	outer.start <= start && end <= outer.end
}

/// Returns true if the two ranges share at least one position, ends inclusive.
pub fn intersects(a: &Range<CharIdx>, b: &Range<CharIdx>) -> bool {
	let (a_start, a_end) = ordered(a);
	let (b_start, b_end) = ordered(b);
	a_start <= b_end && b_start <= a_end
}

/// Translates a range relative to `base` into absolute coordinates.
pub fn offset(range: &Range<CharIdx>, base: CharIdx) -> Range<CharIdx> {
	base.saturating_add(range.start)..base.saturating_add(range.end)
}

/// Counts the characters of `text`.
#[inline]
pub fn char_len(text: &str) -> CharLen {
	text.chars().count()
}

fn ordered(range: &Range<CharIdx>) -> (CharIdx, CharIdx) {
	(range.start.min(range.end), range.start.max(range.end))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn contains_is_inclusive_at_both_ends() {
		assert!(contains(&(4..8), &(8..8)));
		assert!(contains(&(4..8), &(4..4)));
		assert!(contains(&(4..8), &(5..7)));
		assert!(!contains(&(4..8), &(3..5)));
		assert!(!contains(&(4..8), &(9..9)));
	}

	#[test]
	fn intersects_touching_ranges() {
		assert!(intersects(&(0..3), &(3..5)));
		assert!(!intersects(&(0..3), &(4..5)));
		assert!(intersects(&(2..2), &(0..4)));
	}

	#[test]
	fn offset_translates() {
		assert_eq!(offset(&(1..3), 10), 11..13);
	}
}

mod changeset;
mod types;

pub use changeset::ChangeSet;
pub use types::{Bias, Change, ChangeError, Insertion, Operation};

/// Applies host-style changes (sorted, pre-change coordinates) to `doc`.
pub fn apply_changes(doc: &mut crate::Rope, changes: &[Change]) -> Result<(), ChangeError> {
	ChangeSet::from_changes(changes)?.apply(doc)
}

use std::fmt;

/// Opaque identity of a document owned by the host editor.
///
/// The runtime never interprets the value; it only compares identities to
/// decide whether an event concerns the document an instance lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub u64);

impl fmt::Display for DocId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "doc#{}", self.0)
	}
}

use hypersnip_primitives::{ChangeSet, DocId};

use super::instance::SnippetInstance;

/// Live instances, innermost (most recent) on top.
#[derive(Debug, Clone, Default)]
pub struct InstanceStack {
	instances: Vec<SnippetInstance>,
}

impl InstanceStack {
	pub fn push(&mut self, instance: SnippetInstance) {
		self.instances.push(instance);
	}

	pub fn pop(&mut self) -> Option<SnippetInstance> {
		self.instances.pop()
	}

	pub fn top(&self) -> Option<&SnippetInstance> {
		self.instances.last()
	}

	pub(crate) fn top_mut(&mut self) -> Option<&mut SnippetInstance> {
		self.instances.last_mut()
	}

	pub fn clear(&mut self) {
		self.instances.clear();
	}

	pub fn len(&self) -> usize {
		self.instances.len()
	}

	pub fn is_empty(&self) -> bool {
		self.instances.is_empty()
	}

	/// Bottom to top.
	pub fn iter(&self) -> impl Iterator<Item = &SnippetInstance> {
		self.instances.iter()
	}

	/// Maps every instance on `doc` through `changes`; `favored` applies to
	/// the top instance only.
	pub(crate) fn remap(&mut self, doc: DocId, changes: &ChangeSet, favored: Option<usize>) {
		let top = self.instances.len().saturating_sub(1);
		for (idx, instance) in self.instances.iter_mut().enumerate() {
			if instance.doc() == doc {
				instance.remap(changes, favored.filter(|_| idx == top));
			}
		}
	}
}

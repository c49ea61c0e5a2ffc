use indexmap::IndexSet;

use crate::category::ResourceCategory;
use crate::path::NormalizedPath;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WhitelistEntry {
    pub category: ResourceCategory,
    pub path: NormalizedPath,
}

impl WhitelistEntry {
    pub fn new(category: ResourceCategory, path: NormalizedPath) -> Self {
        Self { category, path }
    }
}

/// Accepted resources of one session, deduplicated, in first-insertion order.
///
/// Not internally synchronized; mutation needs `&mut self`.
#[derive(Clone, Debug, Default)]
pub struct WhitelistSet {
    entries: IndexSet<WhitelistEntry>,
}

impl WhitelistSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the entry was not present before.
    ///
    /// Duplicates and empty paths leave the set untouched and return `false`.
    pub fn insert(&mut self, entry: WhitelistEntry) -> bool {
        if entry.path.is_empty() {
            return false;
        }
        self.entries.insert(entry)
    }

    pub fn contains(&self, entry: &WhitelistEntry) -> bool {
        self.entries.contains(entry)
    }

    /// Entries in insertion order. Each call starts from the beginning.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &WhitelistEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear()
    }
}

impl<'a> IntoIterator for &'a WhitelistSet {
    type Item = &'a WhitelistEntry;
    type IntoIter = indexmap::set::Iter<'a, WhitelistEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! Sorted path index
//!
//! Entries live in one vector ordered by path bytes, with a map from path to
//! position. Directory contents are never stored; they are the contiguous
//! range of paths sharing the directory's prefix.
//!
//! Directory records are optional in an archive. Every ancestor of a packed
//! path that has no record of its own is kept as a derived directory, so
//! listings and lookups still reach files packed without their parents.

use crate::entry::{Entry, Metadata};
use std::collections::{BTreeSet, HashMap};

/// Sorted entries plus a path lookup table. Immutable once built.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
    derived_dirs: Vec<Metadata>,
}

impl Index {
    /// Build an index from entries already sorted by path with no duplicates
    pub(crate) fn new(entries: Vec<Entry>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].path() < w[1].path()));
        let positions = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.path().to_string(), i))
            .collect::<HashMap<_, _>>();

        let mut missing = BTreeSet::new();
        for entry in &entries {
            let path = entry.path();
            for (end, _) in path.match_indices('/') {
                let ancestor = &path[..end];
                if !positions.contains_key(ancestor) {
                    missing.insert(ancestor.to_string());
                }
            }
        }
        let derived_dirs = missing.into_iter().map(Metadata::derived_dir).collect();

        Self {
            entries,
            positions,
            derived_dirs,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in path order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an already normalized path
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.position(path).map(|i| &self.entries[i])
    }

    /// Metadata for a recorded entry or a derived directory
    pub fn metadata(&self, path: &str) -> Option<Metadata> {
        match self.get(path) {
            Some(entry) => Some(entry.metadata()),
            None => self.derived_dir(path).cloned(),
        }
    }

    /// A directory implied by deeper paths but never recorded
    pub fn derived_dir(&self, path: &str) -> Option<&Metadata> {
        self.derived_dirs
            .binary_search_by(|meta| meta.path().cmp(path))
            .ok()
            .map(|i| &self.derived_dirs[i])
    }

    /// All derived directories in path order
    pub fn derived_dirs(&self) -> &[Metadata] {
        &self.derived_dirs
    }

    pub fn position(&self, path: &str) -> Option<usize> {
        self.positions.get(path).copied()
    }

    pub fn entry_at(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }

    /// Position of the first path that is `>= root`
    pub fn lower_bound(&self, root: &str) -> usize {
        self.entries.partition_point(|entry| entry.path() < root)
    }

    /// Every entry whose path starts with `prefix`, in path order
    pub fn prefix_range<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries[self.lower_bound(prefix)..]
            .iter()
            .take_while(move |entry| entry.path().starts_with(prefix))
    }
}

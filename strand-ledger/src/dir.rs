// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Forward iteration over paginated directories.
//!
//! A directory is a root page plus zero or more continuation pages linked by
//! page number. Iteration yields entry keys in page order, skipping empty
//! pages, and terminates when no further pages exist.

use crate::view::ReadView;
use strand_models::keylet;
use strand_models::ledger::{DirectoryNode, LedgerObject};
use strand_models::Key;
use tracing::warn;

fn read_page(view: &dyn ReadView, root: &Key, page: u64) -> Option<DirectoryNode> {
    view.read(&keylet::page(root, page))
        .and_then(LedgerObject::into_directory)
}

/// The first entry of a directory: `(page, position, entry key)`.
pub fn dir_first(view: &dyn ReadView, root: &Key) -> Option<(u64, usize, Key)> {
    let node = read_page(view, root, 0)?;
    if let Some(first) = node.indexes.first() {
        return Some((0, 0, *first));
    }
    advance_page(view, root, &node)
}

/// The entry after `(page, pos)`, following page links and skipping empty
/// pages.
pub fn dir_next(view: &dyn ReadView, root: &Key, page: u64, pos: usize) -> Option<(u64, usize, Key)> {
    let node = read_page(view, root, page)?;
    if pos + 1 < node.indexes.len() {
        return Some((page, pos + 1, node.indexes[pos + 1]));
    }
    advance_page(view, root, &node)
}

fn advance_page(view: &dyn ReadView, root: &Key, node: &DirectoryNode) -> Option<(u64, usize, Key)> {
    let mut next = node.index_next;
    while next != 0 {
        match read_page(view, root, next) {
            Some(page) => {
                if let Some(first) = page.indexes.first() {
                    return Some((next, 0, *first));
                }
                next = page.index_next;
            }
            None => {
                warn!("directory {} chain points to missing page {}", root, next);
                return None;
            }
        }
    }
    None
}

/// A directory, identified by its root key within a view.
pub struct Dir<'a> {
    view: &'a dyn ReadView,
    root: Key,
}

impl<'a> Dir<'a> {
    /// Open the directory rooted at `root`.
    pub fn new(view: &'a dyn ReadView, root: Key) -> Self {
        Dir { view, root }
    }

    /// Iterate the directory's entry keys in page order.
    pub fn iter(&self) -> DirIter<'a> {
        DirIter {
            view: self.view,
            root: self.root,
            state: IterState::Start,
        }
    }

    /// Locate a specific entry within a known page, for targeted removal.
    ///
    /// Returns the `(page, position)` of the entry, or `None` if the page
    /// is missing or does not hold the entry.
    pub fn find(&self, page: u64, entry: &Key) -> Option<(u64, usize)> {
        let node = read_page(self.view, &self.root, page)?;
        node.indexes
            .iter()
            .position(|key| key == entry)
            .map(|pos| (page, pos))
    }
}

enum IterState {
    Start,
    At(u64, usize),
    Done,
}

/// Forward-only iterator over a directory's entry keys.
pub struct DirIter<'a> {
    view: &'a dyn ReadView,
    root: Key,
    state: IterState,
}

impl Iterator for DirIter<'_> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        let found = match self.state {
            IterState::Start => dir_first(self.view, &self.root),
            IterState::At(page, pos) => dir_next(self.view, &self.root, page, pos),
            IterState::Done => None,
        };
        match found {
            Some((page, pos, key)) => {
                self.state = IterState::At(page, pos);
                Some(key)
            }
            None => {
                self.state = IterState::Done;
                None
            }
        }
    }
}

//! Shared string table
//!
//! String cells store an index into a workbook-wide table instead of the
//! text itself. The table deduplicates on the write path and never reuses or
//! shifts an index once handed out.

use crate::error::{Error, Result};
use ahash::AHashMap;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Deduplicating, append-only string pool
#[derive(Debug, Default, Clone)]
pub struct SharedStringTable {
    /// Strings by index
    strings: Vec<String>,
    /// Text to first index holding it
    index_map: AHashMap<String, u32>,
    modified: bool,
}

impl SharedStringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from strings as loaded from a file
    ///
    /// Duplicates are kept at their positions; lookups resolve to the first
    /// occurrence.
    pub fn from_strings<I: IntoIterator<Item = String>>(strings: I) -> Self {
        let mut table = Self::new();
        for s in strings {
            table.append(s);
        }
        table.modified = false;
        table
    }

    /// Index of an exact match, if any
    pub fn index_of(&self, text: &str) -> Option<u32> {
        self.index_map.get(text).copied()
    }

    /// Add a string at the end without checking for duplicates
    pub fn append<S: Into<String>>(&mut self, text: S) -> u32 {
        let text = text.into();
        let index = self.strings.len() as u32;
        self.index_map.entry(text.clone()).or_insert(index);
        self.strings.push(text);
        self.modified = true;
        index
    }

    /// Index of `text`, appending it first if it is not in the table
    pub fn get_or_insert(&mut self, text: &str) -> u32 {
        match self.index_of(text) {
            Some(index) => index,
            None => self.append(text),
        }
    }

    /// String at `index`
    pub fn string_at(&self, index: u32) -> Result<&str> {
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or(Error::SharedStringIndex(index, self.strings.len()))
    }

    /// Blank the entry at `index` in place
    ///
    /// Indices are not renumbered: every cell that points at `index` now
    /// reads an empty string. Clearing an out-of-range index does nothing.
    pub fn clear(&mut self, index: u32) {
        let Some(slot) = self.strings.get_mut(index as usize) else {
            return;
        };
        let old = std::mem::take(slot);
        if self.index_map.get(&old) == Some(&index) {
            self.index_map.remove(&old);
        }
        self.modified = true;
    }

    /// Number of entries (cleared entries included)
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over the strings in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Whether the table changed since it was loaded or last saved
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Reset the modified flag
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }
}

/// Handle to the table shared by the worksheets of one workbook
///
/// Cloning the handle shares the table. Each method borrows the table only
/// for the duration of the call.
#[derive(Debug, Default, Clone)]
pub struct SharedStrings(Rc<RefCell<SharedStringTable>>);

impl SharedStrings {
    /// Create a handle to a new, empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing table
    pub fn from_table(table: SharedStringTable) -> Self {
        Self(Rc::new(RefCell::new(table)))
    }

    /// See [`SharedStringTable::index_of`]
    pub fn index_of(&self, text: &str) -> Option<u32> {
        self.0.borrow().index_of(text)
    }

    /// See [`SharedStringTable::append`]
    pub fn append<S: Into<String>>(&self, text: S) -> u32 {
        self.0.borrow_mut().append(text)
    }

    /// See [`SharedStringTable::get_or_insert`]
    pub fn get_or_insert(&self, text: &str) -> u32 {
        self.0.borrow_mut().get_or_insert(text)
    }

    /// Owned copy of the string at `index`
    pub fn string_at(&self, index: u32) -> Result<String> {
        self.0.borrow().string_at(index).map(str::to_string)
    }

    /// See [`SharedStringTable::clear`]
    pub fn clear(&self, index: u32) {
        self.0.borrow_mut().clear(index)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Borrow the table for reading
    pub fn table(&self) -> Ref<'_, SharedStringTable> {
        self.0.borrow()
    }

    /// Reset the modified flag
    pub fn mark_saved(&self) {
        self.0.borrow_mut().mark_saved()
    }

    /// Whether two handles share the same table
    pub fn ptr_eq(&self, other: &SharedStrings) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

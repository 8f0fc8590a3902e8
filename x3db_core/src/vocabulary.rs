//! Name tables shared out-of-band by encoder and decoder.
//!
//! A [`Vocabulary`] holds three independent tables (element names, attribute
//! names, attribute value literals). Indices are assigned positionally in
//! insertion order, so two parties that run the same insertion sequence agree
//! on every code without exchanging the names.

use std::collections::HashMap;
use std::fmt;

use crate::error::VocabularyError;

/// Prefix of synthetic placeholder names. `#` cannot start an XML name.
pub const RESERVED_PREFIX: &str = "#reserved-";

/// Indices travel as `u16` on the wire.
pub const MAX_TABLE_SIZE: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Element,
    Attribute,
    Value,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::Value => "value",
        })
    }
}

/// One direction-complete table: index→name and name→index.
#[derive(Debug, Clone)]
pub struct NameTable {
    kind: TableKind,
    names: Vec<String>,
    indices: HashMap<String, usize>,
    /// Per-index placeholder flag.
    reserved: Vec<bool>,
}

impl NameTable {
    fn new(kind: TableKind) -> Self {
        Self {
            kind,
            names: Vec::new(),
            indices: HashMap::new(),
            reserved: Vec::new(),
        }
    }

    fn insert(&mut self, name: String, reserved: bool) -> Result<usize, VocabularyError> {
        if let Some(&existing) = self.indices.get(&name) {
            return Err(VocabularyError::Collision {
                table: self.kind,
                name,
                existing,
            });
        }
        let index = self.names.len();
        if index >= MAX_TABLE_SIZE {
            return Err(VocabularyError::Full {
                table: self.kind,
                capacity: MAX_TABLE_SIZE,
            });
        }
        self.indices.insert(name.clone(), index);
        self.names.push(name);
        self.reserved.push(reserved);
        Ok(index)
    }

    fn add(&mut self, name: &str) -> Result<usize, VocabularyError> {
        self.insert(name.to_owned(), false)
    }

    fn reserve(&mut self, capacity: usize) -> Result<(), VocabularyError> {
        for index in self.names.len()..capacity {
            self.insert(format!("{RESERVED_PREFIX}{}-{index:04}", self.kind), true)?;
        }
        Ok(())
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Encode direction.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Decode direction.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// `true` for synthetic placeholder slots.
    pub fn is_reserved(&self, index: usize) -> bool {
        self.reserved.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in index order, placeholders included.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}

/// Element, attribute and value tables. Built once, then only read.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    elements: NameTable,
    attributes: NameTable,
    values: NameTable,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self {
            elements: NameTable::new(TableKind::Element),
            attributes: NameTable::new(TableKind::Attribute),
            values: NameTable::new(TableKind::Value),
        }
    }

    /// Append `name` at the next element index.
    pub fn add_element(&mut self, name: &str) -> Result<usize, VocabularyError> {
        self.elements.add(name)
    }

    /// Append `name` at the next attribute index.
    pub fn add_attribute(&mut self, name: &str) -> Result<usize, VocabularyError> {
        self.attributes.add(name)
    }

    /// Append `name` at the next attribute-value index.
    pub fn add_value(&mut self, name: &str) -> Result<usize, VocabularyError> {
        self.values.add(name)
    }

    /// Pad the element table with placeholders up to `capacity` entries.
    pub fn reserve_element(&mut self, capacity: usize) -> Result<(), VocabularyError> {
        self.elements.reserve(capacity)
    }

    /// Pad the attribute table with placeholders up to `capacity` entries.
    pub fn reserve_attribute(&mut self, capacity: usize) -> Result<(), VocabularyError> {
        self.attributes.reserve(capacity)
    }

    pub fn elements(&self) -> &NameTable {
        &self.elements
    }

    pub fn attributes(&self) -> &NameTable {
        &self.attributes
    }

    pub fn values(&self) -> &NameTable {
        &self.values
    }

    pub fn table(&self, kind: TableKind) -> &NameTable {
        match kind {
            TableKind::Element => &self.elements,
            TableKind::Attribute => &self.attributes,
            TableKind::Value => &self.values,
        }
    }
}

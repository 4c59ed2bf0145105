use std::borrow::{Borrow, Cow};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use bstr::BStr;
use indexmap::IndexMap;

use crate::encoding::Encoding;
use crate::error::Result;

/// An immutable, cheaply clonable CSV cell.
///
/// Cells share their bytes, so cloning one (e.g. to use it both as a header
/// key and in a downstream consumer) never copies data.
///
/// Equality and hashing only consider the bytes, not the encoding tag, which
/// makes it possible to look cells up by `&[u8]` or `&str` in a [`Mapping`].
#[derive(Clone)]
pub struct Cell {
    bytes: Arc<[u8]>,
    encoding: Encoding,
}

impl Cell {
    pub fn new(bytes: &[u8], encoding: Encoding) -> Self {
        Self {
            bytes: Arc::from(bytes),
            encoding,
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline(always)]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the cell as text, failing if its bytes are not valid for the
    /// cell's encoding tag.
    pub fn to_str(&self) -> Result<&str> {
        self.encoding.decode(&self.bytes)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl Deref for Cell {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Borrow<[u8]> for Cell {
    fn borrow(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Cell {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // NOTE: must hash exactly like `[u8]` for `Borrow<[u8]>` to be sound
        self.as_bytes().hash(state);
    }
}

impl PartialEq<[u8]> for Cell {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for Cell {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Cell {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes(), Encoding::Utf8)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", BStr::new(self.as_bytes()))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", BStr::new(self.as_bytes()))
    }
}

/// A row keyed by header names, in column order.
pub type Mapping = IndexMap<Cell, Cell>;

/// Shape rows are emitted with, decided once per parser from the header mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowShape {
    Sequence,
    Mapping,
}

/// A parsed CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// Ordered cells, emitted when no headers are active.
    Sequence(Vec<Cell>),
    /// Cells keyed by header name, emitted when headers are active. Cells
    /// beyond the last header are keyed by their stringified column index.
    ///
    /// Such a key can clash with a header of the same name, e.g. `"2"`, in
    /// which case the overflow cell overwrites the header's value.
    Mapping(Mapping),
}

impl Row {
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(cells) => cells.len(),
            Self::Mapping(mapping) => mapping.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns the value keyed by `name`, for mapping rows.
    pub fn get(&self, name: &str) -> Option<&Cell> {
        match self {
            Self::Sequence(_) => None,
            Self::Mapping(mapping) => mapping.get(name.as_bytes()),
        }
    }

    /// Returns the nth cell, in column order, whatever the shape.
    pub fn get_index(&self, index: usize) -> Option<&Cell> {
        match self {
            Self::Sequence(cells) => cells.get(index),
            Self::Mapping(mapping) => mapping.get_index(index).map(|(_, value)| value),
        }
    }

    pub fn as_sequence(&self) -> Option<&[Cell]> {
        match self {
            Self::Sequence(cells) => Some(cells),
            Self::Mapping(_) => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Sequence(_) => None,
            Self::Mapping(mapping) => Some(mapping),
        }
    }

    pub fn into_sequence(self) -> Option<Vec<Cell>> {
        match self {
            Self::Sequence(cells) => Some(cells),
            Self::Mapping(_) => None,
        }
    }

    pub fn into_mapping(self) -> Option<Mapping> {
        match self {
            Self::Sequence(_) => None,
            Self::Mapping(mapping) => Some(mapping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell() {
        let cell = Cell::new("béatrice".as_bytes(), Encoding::Utf8);

        assert_eq!(cell, "béatrice");
        assert_eq!(cell.len(), 9);
        assert_eq!(cell.to_str().unwrap(), "béatrice");
        assert_eq!(format!("{:?}", cell), "\"béatrice\"");

        let shared = cell.clone();
        assert!(Arc::ptr_eq(&cell.bytes, &shared.bytes));

        let latin = Cell::new(b"b\xe9atrice", Encoding::Latin1);
        assert!(latin.to_str().is_err());
        assert_eq!(latin.to_string_lossy(), "b\u{FFFD}atrice");
    }

    #[test]
    fn test_cell_equality_ignores_encoding() {
        let a = Cell::new(b"name", Encoding::Utf8);
        let b = Cell::new(b"name", Encoding::Ascii);

        assert_eq!(a, b);
    }

    #[test]
    fn test_row_accessors() {
        let sequence = Row::Sequence(vec![Cell::from("john"), Cell::from("45")]);

        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.get_index(1).unwrap(), "45");
        assert_eq!(sequence.get("age"), None);
        assert!(!sequence.is_mapping());

        let mut mapping = Mapping::new();
        mapping.insert(Cell::from("name"), Cell::from("john"));
        mapping.insert(Cell::from("age"), Cell::from("45"));
        let mapping = Row::Mapping(mapping);

        assert_eq!(mapping.get("age").unwrap(), "45");
        assert_eq!(mapping.get_index(0).unwrap(), "john");
        assert_eq!(mapping.get("surname"), None);
        assert!(mapping.as_sequence().is_none());
    }
}

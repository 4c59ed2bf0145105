use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::records::{Cell, Mapping};

const INITIAL_ROW_CAPACITY: usize = 32;

/// Accumulates the cells of the row currently reported by the tokenizer and
/// exports it either as a sequence or as a mapping keyed by headers.
///
/// The cell buffer is reused across rows: [`RowBuilder::reset`] only drops
/// the logical length, never the backing capacity.
#[derive(Debug)]
pub struct RowBuilder {
    cells: Vec<Cell>,
    headers: Option<Vec<Cell>>,
    encoding: Encoding,
}

impl RowBuilder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            cells: Vec::with_capacity(INITIAL_ROW_CAPACITY),
            headers: None,
            encoding,
        }
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.cells.clear();
    }

    #[inline]
    pub fn add_cell(&mut self, bytes: &[u8]) {
        let capacity = self.cells.capacity();

        if self.cells.len() == capacity {
            self.cells.reserve_exact(capacity.max(1));
        }

        self.cells.push(Cell::new(bytes, self.encoding));
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline(always)]
    pub fn headers(&self) -> Option<&[Cell]> {
        self.headers.as_deref()
    }

    /// Install header names. Can only be done once until
    /// [`RowBuilder::clear_headers`] is called.
    pub fn set_headers(&mut self, names: Vec<Cell>) -> Result<()> {
        if self.headers.is_some() {
            return Err(Error::state("headers were already set for this pass"));
        }

        self.headers = Some(names);

        Ok(())
    }

    pub fn clear_headers(&mut self) {
        self.headers = None;
    }

    pub fn to_sequence(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    /// Key the current row by header names. Cells beyond the last header are
    /// keyed by their stringified column index, and trailing headers lacking
    /// a cell have no key at all.
    pub fn to_mapping(&self) -> Result<Mapping> {
        let headers = self
            .headers
            .as_ref()
            .ok_or_else(|| Error::state("cannot build a mapping without headers"))?;

        let mut mapping = Mapping::with_capacity(self.cells.len());

        for (header, cell) in headers.iter().zip(self.cells.iter()) {
            mapping.insert(header.clone(), cell.clone());
        }

        for (i, cell) in self.cells.iter().enumerate().skip(headers.len()) {
            let key = Cell::new(i.to_string().as_bytes(), self.encoding);
            mapping.insert(key, cell.clone());
        }

        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with_row(cells: &[&str]) -> RowBuilder {
        let mut builder = RowBuilder::new(Encoding::Utf8);

        for cell in cells {
            builder.add_cell(cell.as_bytes());
        }

        builder
    }

    fn headers(names: &[&str]) -> Vec<Cell> {
        names.iter().map(|name| Cell::from(*name)).collect()
    }

    fn pairs(mapping: &Mapping) -> Vec<(String, String)> {
        mapping
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sequence() {
        let mut builder = builder_with_row(&["name", "surname", "age"]);

        assert_eq!(builder.to_sequence(), headers(&["name", "surname", "age"]));

        builder.reset();
        assert!(builder.is_empty());
        assert!(builder.to_sequence().is_empty());
    }

    #[test]
    fn test_growth_keeps_capacity() {
        let mut builder = RowBuilder::new(Encoding::Utf8);

        for i in 0..100 {
            builder.add_cell(i.to_string().as_bytes());
        }

        assert_eq!(builder.len(), 100);
        assert!(builder.cells.capacity() >= 100);

        let capacity = builder.cells.capacity();
        builder.reset();
        assert_eq!(builder.cells.capacity(), capacity);
    }

    #[test]
    fn test_cells_are_tagged() {
        let mut builder = RowBuilder::new(Encoding::Latin1);
        builder.add_cell(b"b\xe9a");

        assert_eq!(builder.to_sequence()[0].encoding(), Encoding::Latin1);
    }

    #[test]
    fn test_mapping() -> Result<()> {
        let mut builder = builder_with_row(&["john", "45"]);
        builder.set_headers(headers(&["name", "age"]))?;

        assert_eq!(
            pairs(&builder.to_mapping()?),
            vec![
                ("name".to_string(), "john".to_string()),
                ("age".to_string(), "45".to_string())
            ]
        );

        Ok(())
    }

    #[test]
    fn test_mapping_with_extra_cells() -> Result<()> {
        let mut builder = builder_with_row(&["x", "y", "z"]);
        builder.set_headers(headers(&["a", "b"]))?;

        assert_eq!(
            pairs(&builder.to_mapping()?),
            vec![
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
                ("2".to_string(), "z".to_string())
            ]
        );

        Ok(())
    }

    #[test]
    fn test_mapping_overflow_key_clash() -> Result<()> {
        let mut builder = builder_with_row(&["x", "y", "z"]);
        builder.set_headers(headers(&["2", "b"]))?;

        assert_eq!(
            pairs(&builder.to_mapping()?),
            vec![
                ("2".to_string(), "z".to_string()),
                ("b".to_string(), "y".to_string())
            ]
        );

        Ok(())
    }

    #[test]
    fn test_mapping_with_missing_cells() -> Result<()> {
        let mut builder = builder_with_row(&["x"]);
        builder.set_headers(headers(&["a", "b", "c"]))?;

        assert_eq!(
            pairs(&builder.to_mapping()?),
            vec![("a".to_string(), "x".to_string())]
        );

        Ok(())
    }

    #[test]
    fn test_mapping_without_headers() {
        let builder = builder_with_row(&["x"]);

        assert!(matches!(
            builder.to_mapping().unwrap_err().into_kind(),
            crate::ErrorKind::State(_)
        ));
    }

    #[test]
    fn test_headers_are_set_once() -> Result<()> {
        let mut builder = RowBuilder::new(Encoding::Utf8);

        builder.set_headers(headers(&["a"]))?;
        assert!(builder.set_headers(headers(&["b"])).is_err());
        assert_eq!(builder.headers().unwrap(), &headers(&["a"])[..]);

        builder.clear_headers();
        builder.set_headers(headers(&["b"]))?;
        assert_eq!(builder.headers().unwrap(), &headers(&["b"])[..]);

        Ok(())
    }
}

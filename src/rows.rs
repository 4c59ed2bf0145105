use std::iter::FusedIterator;

use crate::error::Result;
use crate::parser::Parser;
use crate::records::Row;

/// A lazy, forward-only iterator over the rows of a borrowed [`Parser`].
///
/// Once exhausted it keeps yielding `None`; only [`Parser::rewind`] can start
/// a new pass. Dropping it midway is always fine.
pub struct Rows<'p> {
    parser: &'p mut Parser,
}

impl<'p> Rows<'p> {
    pub(crate) fn new(parser: &'p mut Parser) -> Self {
        Self { parser }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.parser.shift().transpose()
    }
}

impl FusedIterator for Rows<'_> {}

/// A lazy, forward-only iterator owning its [`Parser`], which is closed when
/// the iterator is dropped.
pub struct IntoRows {
    parser: Parser,
}

impl IntoRows {
    pub(crate) fn new(parser: Parser) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn into_parser(self) -> Parser {
        self.parser
    }
}

impl Iterator for IntoRows {
    type Item = Result<Row>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.parser.shift().transpose()
    }
}

impl FusedIterator for IntoRows {}

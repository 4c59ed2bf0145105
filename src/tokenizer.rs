use std::io::{BufRead, BufReader, Read};

use memchr::{memchr, memchr3};

use crate::error::{Error, Result};
use crate::options::Options;
use crate::utils::{match_bom, trim_trailing_cr, UTF8_BOM};

/// Outcome of a successful [`Tokenizer::parse_more`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A buffer of input was consumed, and zero or more rows were reported.
    Ok,
    /// The source is exhausted. A pending row may still need [`Tokenizer::finish`].
    NoMoreInput,
}

/// View over the cells of the row being reported to a [`RowHandler`].
///
/// Only valid for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct Cells<'a> {
    data: &'a [u8],
    bounds: &'a [(usize, usize)],
}

impl<'a> Cells<'a> {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.bounds
            .get(index)
            .map(|(start, end)| &self.data[*start..*end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let data = self.data;

        self.bounds.iter().map(move |(start, end)| &data[*start..*end])
    }
}

/// Receives rows from a [`Tokenizer`], synchronously, while it holds control.
pub trait RowHandler {
    fn on_row(&mut self, cells: &Cells<'_>) -> Result<()>;
}

impl<F> RowHandler for F
where
    F: FnMut(&Cells<'_>) -> Result<()>,
{
    #[inline]
    fn on_row(&mut self, cells: &Cells<'_>) -> Result<()> {
        self(cells)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    StartRecord,
    StartField,
    Unquoted,
    Quoted,
    Quote,
    Closed,
    ClosedCr,
}

struct CoreTokenizer {
    delimiter: u8,
    quote: u8,
    liberal: bool,
    state: ReadState,
    data: Vec<u8>,
    bounds: Vec<(usize, usize)>,
    field_start: usize,
    // Number of rows reported so far
    rows: u64,
    // Number of bytes consumed before the current input slice
    consumed: u64,
    bom_checked: bool,
    // Number of leading bytes matching a BOM so far, possibly across buffers
    bom_matched: usize,
}

impl CoreTokenizer {
    fn new(delimiter: u8, quote: u8, liberal: bool) -> Self {
        Self {
            delimiter,
            quote,
            liberal,
            state: ReadState::StartRecord,
            data: Vec::new(),
            bounds: Vec::new(),
            field_start: 0,
            rows: 0,
            consumed: 0,
            bom_checked: false,
            bom_matched: 0,
        }
    }

    #[inline]
    fn malformed(&self, pos: usize, reason: &'static str) -> Error {
        Error::malformed(self.rows + 1, self.consumed + pos as u64, reason)
    }

    #[inline]
    fn finalize_field(&mut self) {
        let end = self.data.len();

        self.bounds.push((self.field_start, end));
        self.field_start = end;
    }

    #[inline]
    fn emit_record<H: RowHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        trim_cr: bool,
    ) -> Result<()> {
        if trim_cr {
            let trimmed = trim_trailing_cr(&self.data[self.field_start..]).len();
            self.data.truncate(self.field_start + trimmed);
        }

        self.finalize_field();

        let result = handler.on_row(&Cells {
            data: &self.data,
            bounds: &self.bounds,
        });

        self.data.clear();
        self.bounds.clear();
        self.field_start = 0;
        self.rows += 1;
        self.state = ReadState::StartRecord;

        result
    }

    fn feed<H: RowHandler + ?Sized>(&mut self, input: &[u8], handler: &mut H) -> Result<()> {
        if self.bom_checked {
            return self.scan(input, handler);
        }

        let matched = self.bom_matched;
        let count = match_bom(matched, input);

        if matched + count == UTF8_BOM.len() {
            self.bom_checked = true;
            self.consumed += count as u64;

            return self.scan(&input[count..], handler);
        }

        if count == input.len() {
            // NOTE: the BOM may continue in the next buffer
            self.bom_matched += count;
            self.consumed += count as u64;

            return Ok(());
        }

        self.bom_checked = true;
        self.replay_bom_prefix(handler)?;
        self.scan(input, handler)
    }

    // Bytes held back as a possible BOM turned out to be data
    fn replay_bom_prefix<H: RowHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        let matched = self.bom_matched;
        self.bom_matched = 0;

        if matched == 0 {
            return Ok(());
        }

        self.consumed -= matched as u64;
        self.scan(&UTF8_BOM[..matched], handler)
    }

    fn scan<H: RowHandler + ?Sized>(&mut self, input: &[u8], handler: &mut H) -> Result<()> {
        use ReadState::*;

        let input_len = input.len();
        let mut pos: usize = 0;

        while pos < input_len {
            match self.state {
                StartRecord => {
                    // Empty lines are not records
                    if input[pos] == b'\n' || input[pos] == b'\r' {
                        pos += 1;
                    } else {
                        self.state = StartField;
                    }
                }
                StartField => {
                    if input[pos] == self.quote {
                        self.state = Quoted;
                        pos += 1;
                    } else {
                        self.state = Unquoted;
                    }
                }
                Unquoted => {
                    // Here we are moving to next delimiter, quote or end of line
                    let found = memchr3(self.delimiter, b'\n', self.quote, &input[pos..]);

                    if let Some(offset) = found {
                        self.data.extend_from_slice(&input[pos..pos + offset]);

                        let byte = input[pos + offset];

                        if byte == self.delimiter {
                            self.finalize_field();
                            self.state = StartField;
                        } else if byte == b'\n' {
                            self.emit_record(handler, true)?;
                        } else if self.liberal {
                            // Here, `byte` is guaranteed to be a quote
                            self.data.push(byte);
                        } else {
                            return Err(
                                self.malformed(pos + offset, "unexpected quote in unquoted field")
                            );
                        }

                        pos += offset + 1;
                    } else {
                        self.data.extend_from_slice(&input[pos..]);
                        pos = input_len;
                    }
                }
                Quoted => {
                    // Here we are moving to next quote
                    if let Some(offset) = memchr(self.quote, &input[pos..]) {
                        self.data.extend_from_slice(&input[pos..pos + offset]);
                        pos += offset + 1;
                        self.state = Quote;
                    } else {
                        self.data.extend_from_slice(&input[pos..]);
                        pos = input_len;
                    }
                }
                Quote => {
                    if input[pos] == self.quote {
                        self.data.push(self.quote);
                        self.state = Quoted;
                        pos += 1;
                    } else {
                        // NOTE: the byte is handled in the next iteration
                        self.state = Closed;
                    }
                }
                Closed => {
                    let byte = input[pos];

                    if byte == self.delimiter {
                        self.finalize_field();
                        self.state = StartField;
                    } else if byte == b'\n' {
                        self.emit_record(handler, false)?;
                    } else if byte == b'\r' {
                        self.state = ClosedCr;
                    } else if self.liberal {
                        self.data.push(byte);
                        self.state = Unquoted;
                    } else {
                        return Err(self.malformed(pos, "unexpected byte after closing quote"));
                    }

                    pos += 1;
                }
                ClosedCr => {
                    if input[pos] == b'\n' {
                        self.emit_record(handler, false)?;
                        pos += 1;
                    } else if self.liberal {
                        self.data.push(b'\r');
                        self.state = Unquoted;
                    } else {
                        return Err(self.malformed(pos, "unexpected byte after closing quote"));
                    }
                }
            }
        }

        self.consumed += input_len as u64;

        Ok(())
    }

    fn finish<H: RowHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        use ReadState::*;

        if !self.bom_checked {
            self.bom_checked = true;
            self.replay_bom_prefix(handler)?;
        }

        match self.state {
            StartRecord => Ok(()),
            Quoted if !self.liberal => {
                let err = self.malformed(0, "unterminated quoted field");

                self.data.clear();
                self.bounds.clear();
                self.field_start = 0;
                self.state = StartRecord;

                Err(err)
            }
            Unquoted => self.emit_record(handler, true),
            _ => self.emit_record(handler, false),
        }
    }
}

/// A push-based CSV tokenizer reading from `R`.
///
/// Each call to [`Tokenizer::parse_more`] reads a single buffer and reports,
/// through the given [`RowHandler`], every row completed within it. A row
/// lacking a trailing line terminator is only reported by
/// [`Tokenizer::finish`].
pub struct Tokenizer<R> {
    inner: BufReader<R>,
    core: CoreTokenizer,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(reader: R, options: &Options) -> Self {
        Self {
            inner: BufReader::with_capacity(options.buffer_size, reader),
            core: CoreTokenizer::new(options.delimiter, options.quote, options.liberal_parsing),
        }
    }

    /// Read one more buffer of input and report the rows it completes.
    ///
    /// Errors either come from the underlying reader, from the handler, or
    /// signal malformed input. After an error, the tokenizer should not be
    /// driven any further.
    pub fn parse_more<H: RowHandler + ?Sized>(&mut self, handler: &mut H) -> Result<Status> {
        let input = self.inner.fill_buf()?;
        let input_len = input.len();

        if input_len == 0 {
            return Ok(Status::NoMoreInput);
        }

        let result = self.core.feed(input, handler);

        self.inner.consume(input_len);

        result.map(|_| Status::Ok)
    }

    /// Report the pending row, if the input did not end with a line
    /// terminator. Calling it again without new input is a no-op.
    pub fn finish<H: RowHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        self.core.finish(handler)
    }

    /// Number of rows reported so far.
    pub fn rows(&self) -> u64 {
        self.core.rows
    }

    /// Release the tokenizer, returning the underlying reader. Buffered but
    /// unparsed bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_with(data: &[u8], options: &Options) -> Result<Vec<Vec<String>>> {
        let mut tokenizer = Tokenizer::new(data, options);
        let mut rows = Vec::new();

        let mut handler = |cells: &Cells<'_>| -> Result<()> {
            rows.push(
                cells
                    .iter()
                    .map(|cell| String::from_utf8_lossy(cell).into_owned())
                    .collect::<Vec<_>>(),
            );

            Ok(())
        };

        while tokenizer.parse_more(&mut handler)? == Status::Ok {}

        tokenizer.finish(&mut handler)?;

        Ok(rows)
    }

    fn tokenize(data: &str) -> Result<Vec<Vec<String>>> {
        tokenize_with(data.as_bytes(), &Options::default())
    }

    fn liberal() -> Options {
        Options {
            liberal_parsing: true,
            ..Options::default()
        }
    }

    fn rows(expected: &[&[&str]]) -> Vec<Vec<String>> {
        expected
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_simple() -> Result<()> {
        assert_eq!(
            tokenize("name,surname,age\njohn,landis,45\nlucy,rose,67\n")?,
            rows(&[
                &["name", "surname", "age"],
                &["john", "landis", "45"],
                &["lucy", "rose", "67"]
            ])
        );

        Ok(())
    }

    #[test]
    fn test_quoting() -> Result<()> {
        assert_eq!(
            tokenize("a,\"b,c\",d\n\"landy, the \"\"everlasting\"\" bastard\",\"\"\na,\"b\nc\",d\n")?,
            rows(&[
                &["a", "b,c", "d"],
                &["landy, the \"everlasting\" bastard", ""],
                &["a", "b\nc", "d"]
            ])
        );

        Ok(())
    }

    #[test]
    fn test_line_terminators() -> Result<()> {
        assert_eq!(
            tokenize("a,b\r\n\"c\",\"d\"\r\n\r\n\ne,f")?,
            rows(&[&["a", "b"], &["c", "d"], &["e", "f"]])
        );

        Ok(())
    }

    #[test]
    fn test_empty_fields() -> Result<()> {
        assert_eq!(
            tokenize(",,\na,\n,b")?,
            rows(&[&["", "", ""], &["a", ""], &["", "b"]])
        );

        assert_eq!(tokenize("")?, rows(&[]));
        assert_eq!(tokenize("\n\n")?, rows(&[]));

        Ok(())
    }

    #[test]
    fn test_bom() -> Result<()> {
        assert_eq!(
            tokenize("\u{feff}name,age\n")?,
            rows(&[&["name", "age"]])
        );

        // A partial BOM is data
        assert_eq!(
            tokenize_with(b"\xef\xbbname\n", &Options::default())?,
            rows(&[&["\u{fffd}name"]])
        );
        assert_eq!(
            tokenize_with(b"\xef", &Options::default())?,
            rows(&[&["\u{fffd}"]])
        );

        Ok(())
    }

    #[test]
    fn test_custom_delimiter_and_quote() -> Result<()> {
        let options = Options {
            delimiter: b'\t',
            quote: b'\'',
            ..Options::default()
        };

        assert_eq!(
            tokenize_with(b"a\t'b\tc'\t\"d\"\n", &options)?,
            rows(&[&["a", "b\tc", "\"d\""]])
        );

        Ok(())
    }

    #[test]
    fn test_tiny_buffers() -> Result<()> {
        let data = "name,surname\n\"john\",\"landy, the \"\"everlasting\"\" bastard\"\r\nlucy,rose\n";

        for buffer_size in 1..8 {
            let options = Options {
                buffer_size,
                ..Options::default()
            };

            assert_eq!(
                tokenize_with(data.as_bytes(), &options)?,
                rows(&[
                    &["name", "surname"],
                    &["john", "landy, the \"everlasting\" bastard"],
                    &["lucy", "rose"]
                ])
            );

            // The BOM can span several buffers
            assert_eq!(
                tokenize_with(format!("\u{feff}{}", data).as_bytes(), &options)?,
                rows(&[
                    &["name", "surname"],
                    &["john", "landy, the \"everlasting\" bastard"],
                    &["lucy", "rose"]
                ])
            );
        }

        Ok(())
    }

    #[test]
    fn test_strict_errors() {
        for data in ["a,\"b\n", "a,b\"c\n", "a,\"b\"c\n", "\"a\"\rb\n"] {
            let err = tokenize(data).unwrap_err();
            assert!(err.is_malformed_input(), "{:?} -> {:?}", data, err);
        }
    }

    #[test]
    fn test_error_position() {
        match tokenize("a,b\nc,d\"e\n").unwrap_err().into_kind() {
            crate::ErrorKind::MalformedInput { row, byte, .. } => {
                assert_eq!(row, 2);
                assert_eq!(byte, 7);
            }
            kind => panic!("unexpected error kind: {:?}", kind),
        }
    }

    #[test]
    fn test_liberal() -> Result<()> {
        assert_eq!(
            tokenize_with(b"a,b\"c\nd,\"e\"f\n\"g\"\rh\ni,\"j", &liberal())?,
            rows(&[&["a", "b\"c"], &["d", "ef"], &["g\rh"], &["i", "j"]])
        );

        Ok(())
    }

    #[test]
    fn test_finish_is_idempotent() -> Result<()> {
        let mut tokenizer = Tokenizer::new(&b"a,b"[..], &Options::default());
        let mut count = 0;
        let mut handler = |_: &Cells<'_>| -> Result<()> {
            count += 1;
            Ok(())
        };

        while tokenizer.parse_more(&mut handler)? == Status::Ok {}

        tokenizer.finish(&mut handler)?;
        tokenizer.finish(&mut handler)?;

        assert_eq!(count, 1);
        assert_eq!(tokenizer.rows(), 1);

        Ok(())
    }

    #[test]
    fn test_cells_view() -> Result<()> {
        let mut tokenizer = Tokenizer::new(&b"x,yy,\n"[..], &Options::default());
        let mut seen = Vec::new();
        let mut handler = |cells: &Cells<'_>| -> Result<()> {
            seen.push((
                cells.len(),
                cells.get(1).map(|c| c.to_vec()),
                cells.get(3).is_none(),
            ));
            Ok(())
        };

        tokenizer.parse_more(&mut handler)?;

        assert_eq!(seen, vec![(3, Some(b"yy".to_vec()), true)]);

        Ok(())
    }
}

use std::collections::VecDeque;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::options::{Config, HeaderMode, Options};
use crate::records::{Cell, Row, RowShape};
use crate::row_builder::RowBuilder;
use crate::rows::{IntoRows, Rows};
use crate::source::{Input, Source};
use crate::tokenizer::{Cells, RowHandler, Status, Tokenizer};

// Everything the row callback is allowed to touch while the tokenizer holds
// control.
struct RowSink {
    builder: RowBuilder,
    queue: VecDeque<Row>,
    shape: RowShape,
    skip_lines: u64,
    lines_skipped: u64,
    capture_headers: bool,
    header_row_processed: bool,
    row_count: u64,
    in_cleanup: bool,
}

impl RowSink {
    fn new(options: &Options) -> Result<Self> {
        let mut builder = RowBuilder::new(options.encoding);

        if let HeaderMode::Explicit(names) = &options.headers {
            builder.set_headers(
                names
                    .iter()
                    .map(|name| Cell::new(name.as_bytes(), options.encoding))
                    .collect(),
            )?;
        }

        Ok(Self {
            builder,
            queue: VecDeque::new(),
            shape: if options.headers.is_active() {
                RowShape::Mapping
            } else {
                RowShape::Sequence
            },
            skip_lines: options.skip_lines,
            lines_skipped: 0,
            capture_headers: options.headers.captures_from_input(),
            header_row_processed: false,
            row_count: 0,
            in_cleanup: false,
        })
    }

    fn reset(&mut self) {
        if self.capture_headers {
            self.builder.clear_headers();
        }

        self.queue.clear();
        self.lines_skipped = 0;
        self.header_row_processed = false;
        self.row_count = 0;
        self.in_cleanup = false;
    }
}

impl RowHandler for RowSink {
    fn on_row(&mut self, cells: &Cells<'_>) -> Result<()> {
        if self.in_cleanup {
            return Ok(());
        }

        self.builder.reset();

        for cell in cells.iter() {
            self.builder.add_cell(cell);
        }

        if self.lines_skipped < self.skip_lines {
            self.lines_skipped += 1;
            return Ok(());
        }

        if self.capture_headers && !self.header_row_processed {
            self.builder.set_headers(self.builder.to_sequence())?;
            self.header_row_processed = true;
            return Ok(());
        }

        let row = match self.shape {
            RowShape::Sequence => Row::Sequence(self.builder.to_sequence()),
            RowShape::Mapping => Row::Mapping(self.builder.to_mapping()?),
        };

        self.queue.push_back(row);
        self.row_count += 1;

        Ok(())
    }
}

/// A pull-based CSV parser.
///
/// The underlying [`Tokenizer`] only knows how to report rows through a
/// callback, so the parser buffers the rows it reports in a queue and only
/// drives it forward when the queue is empty.
///
/// Rows are [`Row::Sequence`] when no headers are configured, and
/// [`Row::Mapping`] otherwise.
///
/// Dropping a parser closes it.
pub struct Parser {
    tokenizer: Option<Tokenizer<Source>>,
    sink: RowSink,
    options: Options,
    seekable: bool,
    closed: bool,
    eof_reached: bool,
    // Set when the tokenizer failed, leaving a partial row that must never be
    // finished
    poisoned: bool,
    pending_error: Option<Error>,
}

impl Parser {
    /// Create a parser over the given input.
    ///
    /// Options are resolved before the input is opened, so that invalid
    /// configuration never holds any resource.
    pub fn new(input: Input, config: &Config) -> Result<Self> {
        let options = Options::resolve(config)?;
        let sink = RowSink::new(&options)?;
        let source = input.open()?;

        debug!(
            source = source.kind(),
            delimiter = %(options.delimiter as char),
            headers = ?options.headers,
            "opening CSV parser"
        );

        Ok(Self {
            seekable: source.is_seekable(),
            tokenizer: Some(Tokenizer::new(source, &options)),
            sink,
            options,
            closed: false,
            eof_reached: false,
            poisoned: false,
            pending_error: None,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        Self::new(Input::path(path.as_ref()), config)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>, config: &Config) -> Result<Self> {
        Self::new(Input::bytes(bytes), config)
    }

    /// Create a parser over a stream that cannot be rewound.
    pub fn from_reader<R: Read + 'static>(reader: R, config: &Config) -> Result<Self> {
        Self::new(Input::reader(reader), config)
    }

    pub fn from_seekable_reader<R: Read + Seek + 'static>(
        reader: R,
        config: &Config,
    ) -> Result<Self> {
        Self::new(Input::seekable_reader(reader), config)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Header names, once known. Explicit headers are known from the start,
    /// while headers read from input are only known after the first pull.
    pub fn headers(&self) -> Option<&[Cell]> {
        self.sink.builder.headers()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of data rows parsed since the start of the current pass.
    pub fn row_count(&self) -> u64 {
        self.sink.row_count
    }

    fn finish_safe(&mut self) -> Result<()> {
        match self.tokenizer.as_mut() {
            Some(tokenizer) if !self.sink.in_cleanup && !self.poisoned => {
                tokenizer.finish(&mut self.sink)
            }
            _ => Ok(()),
        }
    }

    fn advance(&mut self) -> Result<()> {
        let tokenizer = match self.tokenizer.as_mut() {
            Some(tokenizer) => tokenizer,
            None => {
                self.eof_reached = true;
                return Ok(());
            }
        };

        let queued = self.sink.queue.len();
        let status = tokenizer.parse_more(&mut self.sink)?;

        trace!(rows = self.sink.queue.len() - queued, ?status, "tokenizer advanced");

        if status == Status::NoMoreInput && !self.eof_reached {
            // NOTE: finishing must happen before marking EOF, to flush a
            // final row lacking a line terminator.
            self.finish_safe()?;
            self.eof_reached = true;
        }

        Ok(())
    }

    /// Return the next row, or `None` when the stream is exhausted or the
    /// parser is closed.
    ///
    /// If malformed input is found, rows parsed before the offending one are
    /// still returned first, then the error is raised and the parser behaves
    /// as exhausted until rewound.
    pub fn shift(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Ok(None);
        }

        loop {
            if let Some(row) = self.sink.queue.pop_front() {
                return Ok(Some(row));
            }

            if let Some(err) = self.pending_error.take() {
                return Err(err);
            }

            if self.eof_reached {
                return Ok(None);
            }

            if let Err(err) = self.advance() {
                self.eof_reached = true;
                self.poisoned = true;

                match self.sink.queue.pop_front() {
                    Some(row) => {
                        self.pending_error = Some(err);
                        return Ok(Some(row));
                    }
                    None => return Err(err),
                }
            }
        }
    }

    /// Call `callback` with every remaining row.
    pub fn each<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(Row),
    {
        while let Some(row) = self.shift()? {
            callback(row);
        }

        Ok(())
    }

    /// Collect every remaining row.
    pub fn read_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        self.each(|row| rows.push(row))?;

        Ok(rows)
    }

    /// Lazily iterate over the remaining rows.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows::new(self)
    }

    /// Restart parsing from the beginning of the source, re-running
    /// `skip_lines` and header capture. Explicit headers stay installed.
    pub fn rewind(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::state("cannot rewind a closed parser"));
        }

        if !self.seekable {
            return Err(Error::new(ErrorKind::Unsupported(
                "cannot rewind a parser reading from a non-seekable stream",
            )));
        }

        let mut tokenizer = match self.tokenizer.take() {
            Some(tokenizer) => tokenizer,
            None => return Err(Error::state("parser has no live tokenizer")),
        };

        if !self.sink.in_cleanup && !self.poisoned {
            if let Err(err) = tokenizer.finish(&mut self.sink) {
                warn!(error = %err, "ignoring error while finishing rewound tokenizer");
            }
        }

        let mut source = tokenizer.into_inner();

        if let Err(err) = source.rewind() {
            self.closed = true;
            return Err(err.into());
        }

        self.tokenizer = Some(Tokenizer::new(source, &self.options));
        self.sink.reset();
        self.eof_reached = false;
        self.poisoned = false;
        self.pending_error = None;

        debug!("rewound CSV parser");

        Ok(())
    }

    /// Release the tokenizer and the source. Closing is idempotent and never
    /// fails: secondary errors are logged and ignored.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;

        if self.tokenizer.is_some() {
            if let Err(err) = self.finish_safe() {
                warn!(error = %err, "ignoring error while closing CSV parser");
            }

            // NOTE: from now on, no row can be built anymore
            self.sink.in_cleanup = true;

            if let Some(tokenizer) = self.tokenizer.take() {
                drop(tokenizer.into_inner());
            }
        }

        debug!(rows = self.sink.row_count, "closed CSV parser");
    }
}

impl Drop for Parser {
    fn drop(&mut self) {
        self.close();
    }
}

impl IntoIterator for Parser {
    type Item = Result<Row>;
    type IntoIter = IntoRows;

    fn into_iter(self) -> Self::IntoIter {
        IntoRows::new(self)
    }
}

impl<'p> IntoIterator for &'p mut Parser {
    type Item = Result<Row>;
    type IntoIter = Rows<'p>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Parser")
            .field("options", &self.options)
            .field("headers", &self.headers())
            .field("row_count", &self.sink.row_count)
            .field("queued", &self.sink.queue.len())
            .field("closed", &self.closed)
            .field("eof_reached", &self.eof_reached)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

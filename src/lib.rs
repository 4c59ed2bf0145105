/*!
The `pull-csv` crate turns a push-based, callback-driven CSV tokenizer into a
lazy, row-at-a-time pull interface.

Rows are either ordered sequences of cells, or mappings keyed by header names
when headers are read from the input or supplied upfront. Leading lines can
be skipped, field delimiter and quote character can be customized, and every
cell is tagged with a caller-chosen text encoding (cells are never transcoded).

# Examples

*Pulling rows one at a time*

```
use pull_csv::{Config, Parser};

let mut parser = Parser::from_path("data.csv", &Config::new())?;

while let Some(row) = parser.shift()? {
    dbg!(row);
}
```

*Reading rows keyed by headers*

```
use pull_csv::{Config, Parser};

let mut config = Config::new();
config.headers(true).col_sep(";");

let mut parser = Parser::from_bytes("name;age\nAda;36\n", &config)?;

for row in parser.rows() {
    let row = row?;
    println!("{} is {}", row.get("name").unwrap(), row.get("age").unwrap());
}
```

*One-shot helpers*

```
let rows = pull_csv::parse("a,b\n1,2\n", &pull_csv::Config::new())?;
assert_eq!(rows.len(), 2);
```

# Design notes

## Push to pull

The [`Tokenizer`] only knows how to read a buffer of input and report every
row completed within it through a [`RowHandler`] callback. The [`Parser`]
holds a queue of completed rows and only drives the tokenizer forward when
this queue is empty, so that pulling one row never skips data that was
already parsed.

Header rows and skipped lines are consumed by the callback without ever
reaching the queue.

## Teardown

A parser can be closed at any point, explicitly or by dropping it. Closing
first flushes a final row lacking a line terminator, then raises a cleanup
flag neutralizing the row callback, and only then releases the tokenizer and
the source. Closing never fails.

## Line terminators

Rows end with either LF or CRLF. Empty lines are not rows, and are not
counted by the `skip_lines` option either.
*/
mod encoding;
mod error;
mod options;
mod parser;
mod records;
mod row_builder;
mod rows;
mod source;
mod tokenizer;
mod utils;

use std::path::Path;

pub use encoding::Encoding;
pub use error::{Error, ErrorKind, Result};
pub use options::{Config, HeaderMode, HeaderSetting, Options};
pub use parser::Parser;
pub use records::{Cell, Mapping, Row};
pub use row_builder::RowBuilder;
pub use rows::{IntoRows, Rows};
pub use source::{Input, ReadSeek};
pub use tokenizer::{Cells, RowHandler, Status, Tokenizer};

/// Parse in-memory CSV data and collect every row.
pub fn parse(data: impl Into<Vec<u8>>, config: &Config) -> Result<Vec<Row>> {
    Parser::from_bytes(data, config)?.read_all()
}

/// Lazily iterate over the rows of in-memory CSV data.
pub fn parse_iter(data: impl Into<Vec<u8>>, config: &Config) -> Result<IntoRows> {
    Ok(Parser::from_bytes(data, config)?.into_iter())
}

/// Read a whole CSV file into memory, row by row.
pub fn read<P: AsRef<Path>>(path: P, config: &Config) -> Result<Vec<Row>> {
    Parser::from_path(path, config)?.read_all()
}

/// Stream the rows of a CSV file through `callback`.
pub fn foreach<P, F>(path: P, config: &Config, callback: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(Row),
{
    let mut parser = Parser::from_path(path, config)?;
    let result = parser.each(callback);
    parser.close();

    result
}

/// Open a CSV file for reading.
pub fn open<P: AsRef<Path>>(path: P, config: &Config) -> Result<Parser> {
    Parser::from_path(path, config)
}

/// Open a CSV file, hand the parser to `f` and close it afterwards, whether
/// `f` succeeded or not.
pub fn with_open<P, F, T>(path: P, config: &Config, f: F) -> Result<T>
where
    P: AsRef<Path>,
    F: FnOnce(&mut Parser) -> Result<T>,
{
    let mut parser = Parser::from_path(path, config)?;
    let result = f(&mut parser);
    parser.close();

    result
}

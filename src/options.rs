#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::encoding::Encoding;
use crate::error::{Error, Result};

pub(crate) const DEFAULT_BUFFER_SIZE: usize = 256 * (1 << 10);

/// Raw value of the `headers` option, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(untagged))]
pub enum HeaderSetting {
    Flag(bool),
    Names(Vec<String>),
}

impl From<bool> for HeaderSetting {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<Vec<String>> for HeaderSetting {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

impl From<&[&str]> for HeaderSetting {
    fn from(names: &[&str]) -> Self {
        Self::Names(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderSetting {
    fn from(names: [&str; N]) -> Self {
        Self::from(&names[..])
    }
}

/// Builds a raw configuration bag for a [`Parser`](crate::Parser).
///
/// Every field is optional and nothing is validated until the bag is handed
/// to [`Options::resolve`], which happens when a parser is constructed.
///
/// ```
/// use pull_csv::Config;
///
/// let mut config = Config::new();
/// config.col_sep("\t").headers(true).skip_lines(2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(default, deny_unknown_fields))]
pub struct Config {
    pub col_sep: Option<String>,
    pub quote_char: Option<String>,
    pub headers: Option<HeaderSetting>,
    pub skip_lines: Option<i64>,
    pub liberal_parsing: Option<bool>,
    pub encoding: Option<String>,
    pub buffer_size: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn col_sep(&mut self, col_sep: impl Into<String>) -> &mut Self {
        self.col_sep = Some(col_sep.into());
        self
    }

    pub fn quote_char(&mut self, quote_char: impl Into<String>) -> &mut Self {
        self.quote_char = Some(quote_char.into());
        self
    }

    /// Either a flag telling whether the first row holds the headers, or an
    /// explicit list of header names.
    pub fn headers(&mut self, headers: impl Into<HeaderSetting>) -> &mut Self {
        self.headers = Some(headers.into());
        self
    }

    /// Number of leading rows to discard before any header or data handling.
    ///
    /// Blank lines are never rows, so they are not counted: with `1`, the
    /// input `"\nA,B\n1,2\n"` skips `A,B`.
    pub fn skip_lines(&mut self, skip_lines: i64) -> &mut Self {
        self.skip_lines = Some(skip_lines);
        self
    }

    pub fn liberal_parsing(&mut self, yes: bool) -> &mut Self {
        self.liberal_parsing = Some(yes);
        self
    }

    pub fn encoding(&mut self, label: impl Into<String>) -> &mut Self {
        self.encoding = Some(label.into());
        self
    }

    pub fn buffer_size(&mut self, size: usize) -> &mut Self {
        self.buffer_size = Some(size);
        self
    }
}

/// How header names are obtained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Rows are emitted as ordered sequences.
    #[default]
    Off,
    /// The first non-skipped row is consumed as header names.
    On,
    /// Header names are supplied upfront and no input row is consumed.
    Explicit(Vec<String>),
}

impl HeaderMode {
    /// Whether rows are emitted as mappings.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Off)
    }

    pub(crate) fn captures_from_input(&self) -> bool {
        matches!(self, Self::On)
    }
}

/// Fully resolved parser options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub delimiter: u8,
    pub quote: u8,
    pub headers: HeaderMode,
    pub skip_lines: u64,
    pub liberal_parsing: bool,
    pub encoding: Encoding,
    pub buffer_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            headers: HeaderMode::Off,
            skip_lines: 0,
            liberal_parsing: false,
            encoding: Encoding::Utf8,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

fn single_byte(option: &'static str, value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] if *byte == b'\n' || *byte == b'\r' => {
            Err(Error::config(option, "cannot be a line terminator"))
        }
        [byte] => Ok(*byte),
        bytes => Err(Error::config(
            option,
            format!("must be exactly one byte, got {}", bytes.len()),
        )),
    }
}

impl Options {
    /// Normalize a raw configuration bag, applying defaults to every absent
    /// field.
    pub fn resolve(config: &Config) -> Result<Self> {
        let mut options = Self::default();

        if let Some(col_sep) = &config.col_sep {
            options.delimiter = single_byte("col_sep", col_sep)?;
        }

        if let Some(quote_char) = &config.quote_char {
            options.quote = single_byte("quote_char", quote_char)?;
        }

        if options.delimiter == options.quote {
            return Err(Error::config(
                "quote_char",
                "cannot be the same byte as col_sep",
            ));
        }

        options.headers = match &config.headers {
            None | Some(HeaderSetting::Flag(false)) => HeaderMode::Off,
            Some(HeaderSetting::Flag(true)) => HeaderMode::On,
            Some(HeaderSetting::Names(names)) => HeaderMode::Explicit(names.clone()),
        };

        if let Some(skip_lines) = config.skip_lines {
            options.skip_lines = u64::try_from(skip_lines).map_err(|_| {
                Error::config("skip_lines", format!("must be >= 0, got {}", skip_lines))
            })?;
        }

        options.liberal_parsing = config.liberal_parsing.unwrap_or(false);

        if let Some(label) = &config.encoding {
            options.encoding = label.parse()?;
        }

        if let Some(buffer_size) = config.buffer_size {
            if buffer_size == 0 {
                return Err(Error::config("buffer_size", "must be > 0"));
            }

            options.buffer_size = buffer_size;
        }

        Ok(options)
    }
}

impl TryFrom<&Config> for Options {
    type Error = Error;

    fn try_from(config: &Config) -> Result<Self> {
        Self::resolve(config)
    }
}

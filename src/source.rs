use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;

/// A readable and seekable stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Where a [`Parser`](crate::Parser) reads its bytes from.
///
/// The kind of source is always explicit: a string is never guessed to be
/// either a path or inline CSV data.
pub enum Input {
    /// A filesystem path, opened read-only.
    Path(PathBuf),
    /// In-memory bytes, wrapped as a seekable stream.
    Bytes(Vec<u8>),
    /// Any readable stream. Parsers built on it cannot be rewound.
    Reader(Box<dyn Read>),
    /// A readable & seekable stream.
    SeekableReader(Box<dyn ReadSeek>),
}

impl Input {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    pub fn reader<R: Read + 'static>(reader: R) -> Self {
        Self::Reader(Box::new(reader))
    }

    pub fn seekable_reader<R: Read + Seek + 'static>(reader: R) -> Self {
        Self::SeekableReader(Box::new(reader))
    }

    pub(crate) fn open(self) -> io::Result<Source> {
        Ok(match self {
            Self::Path(path) => Source::File(File::open(path)?),
            Self::Bytes(bytes) => Source::Memory(Cursor::new(bytes)),
            Self::Reader(reader) => Source::Stream(reader),
            Self::SeekableReader(reader) => Source::SeekableStream(reader),
        })
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Reader(_) => f.write_str("Reader"),
            Self::SeekableReader(_) => f.write_str("SeekableReader"),
        }
    }
}

/// An opened input, exclusively owned by a single parser.
pub(crate) enum Source {
    File(File),
    Memory(Cursor<Vec<u8>>),
    Stream(Box<dyn Read>),
    SeekableStream(Box<dyn ReadSeek>),
}

impl Source {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory(_) => "memory",
            Self::Stream(_) => "stream",
            Self::SeekableStream(_) => "seekable stream",
        }
    }

    pub(crate) fn is_seekable(&self) -> bool {
        !matches!(self, Self::Stream(_))
    }

    /// Reposition the source to its start.
    pub(crate) fn rewind(&mut self) -> io::Result<()> {
        match self {
            Self::File(file) => file.seek(SeekFrom::Start(0)).map(|_| ()),
            Self::Memory(cursor) => {
                cursor.set_position(0);
                Ok(())
            }
            Self::SeekableStream(stream) => stream.seek(SeekFrom::Start(0)).map(|_| ()),
            Self::Stream(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stream is not seekable",
            )),
        }
    }
}

impl Read for Source {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
            Self::Stream(stream) => stream.read(buf),
            Self::SeekableStream(stream) => stream.read(buf),
        }
    }
}

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("entry `{0}` not found")]
    EntryNotFound(String),
    #[error("unexpected end of input")]
    TruncatedInput,
    #[error("unsupported pixel format {0:#06x}")]
    UnsupportedFormat(u16),
    #[error("{width}x{height} is not a multiple of the {granularity}-texel tile size")]
    InvalidDimensions {
        width: usize,
        height: usize,
        granularity: usize,
    },
    #[error("invalid texture directory: {0}")]
    InvalidDirectory(&'static str),
    #[error("corrupt sprite: {0}")]
    CorruptSprite(String),
    #[error("palette declares {declared} bytes but only {available} remain")]
    TruncatedPalette { declared: usize, available: usize },
    #[error("unrecognized archive `{0}`")]
    UnknownArchive(String),
    #[error(transparent)]
    IOError(io::Error),
    #[error(transparent)]
    PNGEncodingError(#[from] png::EncodingError),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Self::TruncatedInput,
            _ => Self::IOError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reads_become_truncated_input() {
        let e: Error = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(e, Error::TruncatedInput));

        let e: Error = io::Error::from(io::ErrorKind::NotFound).into();
        assert!(matches!(e, Error::IOError(_)));
    }
}

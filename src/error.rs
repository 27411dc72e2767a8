#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

//===========================================================================//

/// The three mutually exclusive ways a conversion can fail.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ErrorKind {
    /// The source image could not be located or opened.
    #[cfg_attr(feature = "serde", serde(rename = "FILE_NOT_FOUND"))]
    NotFound,
    /// The source bytes are not a well-formed PNG image.
    #[cfg_attr(feature = "serde", serde(rename = "INVALID_PNG"))]
    InvalidFormat,
    /// Encoding the icon or writing it to its destination failed.
    #[cfg_attr(feature = "serde", serde(rename = "ENCODING_ERROR"))]
    EncodingError,
}

impl ErrorKind {
    /// Returns the stable, machine-readable code for this kind of error.
    pub fn code(&self) -> &'static str {
        match *self {
            ErrorKind::NotFound => "FILE_NOT_FOUND",
            ErrorKind::InvalidFormat => "INVALID_PNG",
            ErrorKind::EncodingError => "ENCODING_ERROR",
        }
    }
}

//===========================================================================//

/// An error from converting a PNG image into an ICO file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source path does not exist.
    #[error("PNG file does not exist: {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source path exists but could not be read.
    #[error("cannot open {}: {source}", path.display())]
    Unreadable {
        /// The path that was opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source bytes don't decode as a PNG image.
    #[error("not a valid PNG file: {0}")]
    InvalidFormat(#[source] io::Error),

    /// The destination file could not be created.
    #[error("cannot create output file {}: {source}", path.display())]
    CreateDestination {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Encoding a payload, assembling the container, or writing it failed.
    #[error("error encoding ICO file: {0}")]
    Encoding(#[source] io::Error),
}

impl Error {
    /// Returns which of the three failure categories this error falls in.
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::NotFound { .. } | Error::Unreadable { .. } => {
                ErrorKind::NotFound
            }
            Error::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Error::CreateDestination { .. } | Error::Encoding(_) => {
                ErrorKind::EncodingError
            }
        }
    }
}

/// A `Result` alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};
    use std::io;

    #[test]
    fn kinds_are_mutually_exclusive() {
        let not_found = Error::NotFound {
            path: "missing.png".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let unreadable = Error::Unreadable {
            path: "dir.png".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let invalid = Error::InvalidFormat(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid signature",
        ));
        let create = Error::CreateDestination {
            path: "/nope/out.ico".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let encoding =
            Error::Encoding(io::Error::from(io::ErrorKind::WriteZero));
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(unreadable.kind(), ErrorKind::NotFound);
        assert_eq!(invalid.kind(), ErrorKind::InvalidFormat);
        assert_eq!(create.kind(), ErrorKind::EncodingError);
        assert_eq!(encoding.kind(), ErrorKind::EncodingError);
    }

    #[test]
    fn codes() {
        assert_eq!(ErrorKind::NotFound.code(), "FILE_NOT_FOUND");
        assert_eq!(ErrorKind::InvalidFormat.code(), "INVALID_PNG");
        assert_eq!(ErrorKind::EncodingError.code(), "ENCODING_ERROR");
    }

    #[test]
    fn messages_name_the_path() {
        let error = Error::NotFound {
            path: "missing.png".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(error.to_string(), "PNG file does not exist: missing.png");
    }
}

//===========================================================================//

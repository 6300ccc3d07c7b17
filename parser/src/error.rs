//! The error type shared by the streaming stages.

use snafu::{Backtrace, Snafu};

/// Fatal errors raised while parsing, collecting or assembling a part
/// stream.
///
/// Recoverable anomalies (odd value lengths, wrong file meta group
/// lengths, unexpected elements inside fragments and the like) are
/// logged as warnings instead and never surface here.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// No valid DICOM encoding could be detected at the start of the
    /// stream.
    #[snafu(display("not DICOM data: no valid encoding found at stream start"))]
    NotDicom {
        /// error backtrace
        backtrace: Backtrace,
    },
    /// The stream announces implicit VR big endian encoding, which is
    /// not a defined transfer syntax.
    #[snafu(display("implicit VR big endian encoding is not supported"))]
    ImplicitBigEndianNotSupported {
        /// error backtrace
        backtrace: Backtrace,
    },
    /// The upstream source closed in the middle of an element header or
    /// another required read.
    #[snafu(display("DICOM stream truncated at position {}", position))]
    Truncated {
        /// the stream position at which data ran out
        position: u64,
        /// error backtrace
        backtrace: Backtrace,
    },
    /// The collect flow exceeded its buffering limit before its stop
    /// condition fired.
    #[snafu(display("collect buffer overflow: {} bytes exceed the maximum of {}", size, max))]
    BufferOverflow {
        /// the number of bytes that would have been buffered
        size: usize,
        /// the configured buffering limit
        max: usize,
        /// error backtrace
        backtrace: Backtrace,
    },
    /// Reading from the upstream source failed.
    #[snafu(display("could not read from source"))]
    Io {
        /// the underlying I/O error
        source: std::io::Error,
        /// error backtrace
        backtrace: Backtrace,
    },
}

/// The result type of the streaming stages.
pub type Result<T, E = Error> = std::result::Result<T, E>;

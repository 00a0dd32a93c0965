//! Errors specific to the hash chain traversal
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enum of errors associated with the hash chain traversal
pub enum Error {
    /// Error occurs when the requested chain length is not a power of two of
    /// at least two. Raised at construction, fatal to that instance.
    InvalidChainLength(u64),
    /// Error occurs when `next_output` is called after every chain element
    /// below the commitment has been released. Recoverable by the caller:
    /// simply stop calling.
    ExhaustedChain,
    /// Error occurs when the size of a chain element is not the expected.
    InvalidValueSize(usize),
    /// Error occurs when the size of a persisted traversal state is not the
    /// expected.
    InvalidStateSize(usize),
    /// Error that occurs when a persisted traversal state fails an internal
    /// consistency check on reload. Fatal; the only recovery path is
    /// re-deriving the traversal from the seed.
    CorruptState(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidChainLength(n) => {
                write!(f, "chain length {} is not a power of two >= 2", n)
            }
            Error::ExhaustedChain => write!(f, "all chain elements have been released"),
            Error::InvalidValueSize(size) => {
                write!(f, "invalid chain element size: {}", size)
            }
            Error::InvalidStateSize(size) => {
                write!(f, "invalid traversal state size: {}", size)
            }
            Error::CorruptState(reason) => write!(f, "corrupt traversal state: {}", reason),
        }
    }
}

impl StdError for Error {}

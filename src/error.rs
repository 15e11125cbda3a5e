//! Usage errors surfaced by container operations.
//!
//! Every error carries one of two kinds. Internal invariant violations are
//! not represented here: they indicate a bug in this crate and panic.

use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// A position outside the container was dereferenced or traversed.
    OutOfRange,
    /// An argument was malformed independently of the container state.
    InvalidArgument,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum Error {
    #[error("handle is at the end position")]
    PastEnd,
    #[error("cannot move before the first element")]
    BeforeBegin,
    #[error("handle belongs to a different container")]
    ForeignHandle,
    #[error("handle refers to an erased element")]
    StaleHandle,
    #[error("key not present")]
    KeyNotFound,
    #[error("range end is not reachable from range begin")]
    InvalidRange,
    #[error("max load factor must be finite and at least 2^-16")]
    InvalidLoadFactor,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PastEnd
            | Error::BeforeBegin
            | Error::ForeignHandle
            | Error::StaleHandle
            | Error::KeyNotFound => ErrorKind::OutOfRange,
            Error::InvalidRange | Error::InvalidLoadFactor => ErrorKind::InvalidArgument,
        }
    }
}

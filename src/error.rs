//! Crate error types.
//!
//! Failures are reported twice, on purpose: as an [`NrrdError`] travelling
//! up through `Result`, and as a frame on the `"nrrd"` biff stack
//! (see [`crate::biff`]), where callers composing larger operations add
//! their own context frames.

use crate::biff;
use crate::fp::Sanity;
use std::io::Error as IoError;

quick_error! {
    /// Error type for all operations in this crate.
    #[derive(Debug)]
    pub enum NrrdError {
        /// An array invariant does not hold (wrong data size, unknown
        /// type, dimension out of range, ...).
        Validation(msg: String) {
            display("invalid nrrd: {}", msg)
        }
        /// Malformed header, unknown field value, wrong number of tokens.
        Parse(msg: String) {
            display("parse error: {}", msg)
        }
        /// I/O error from the underlying stream.
        Io(err: IoError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
        /// A read returned fewer elements than requested.
        ShortRead(got: usize, expected: usize) {
            display("got only {} of {} elements", got, expected)
        }
        /// A write consumed fewer bytes than offered.
        ShortWrite(got: usize, expected: usize) {
            display("wrote only {} of {} bytes", got, expected)
        }
        /// An encoding or format that was not compiled in.
        Unavailable(what: &'static str) {
            display("{} not available", what)
        }
        /// Operation valid in general but not supported for this data.
        Unsupported(msg: String) {
            display("unsupported: {}", msg)
        }
        /// The floating-point environment failed its startup self-test.
        Sanity(status: Sanity) {
            display("sanity check failed: {}", status)
        }
    }
}

impl NrrdError {
    /// Build a validation error, leaving the message on the biff stack.
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        biff::add(biff::NRRD, msg.clone());
        NrrdError::Validation(msg)
    }

    /// Build a parse error, leaving the message on the biff stack.
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        biff::add(biff::NRRD, msg.clone());
        NrrdError::Parse(msg)
    }

    /// Build an unsupported-operation error, leaving the message on the
    /// biff stack.
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        biff::add(biff::NRRD, msg.clone());
        NrrdError::Unsupported(msg)
    }

    /// Build a short-read error, leaving the message on the biff stack.
    pub(crate) fn short_read(me: &str, got: usize, expected: usize) -> Self {
        biff::add(
            biff::NRRD,
            format!("{}: got only {} of {} elements", me, got, expected),
        );
        NrrdError::ShortRead(got, expected)
    }

    /// Build a short-write error, leaving the message on the biff stack.
    pub(crate) fn short_write(me: &str, got: usize, expected: usize) -> Self {
        biff::add(
            biff::NRRD,
            format!("{}: wrote only {} of {} bytes", me, got, expected),
        );
        NrrdError::ShortWrite(got, expected)
    }

    /// Build a resource-unavailable error, leaving the message on the
    /// biff stack.
    pub(crate) fn unavailable(me: &str, what: &'static str) -> Self {
        biff::add(biff::NRRD, format!("{}: {} not available", me, what));
        NrrdError::Unavailable(what)
    }

    /// Add a context frame on the biff stack and pass the error through.
    pub(crate) fn context(self, msg: impl Into<String>) -> Self {
        biff::add(biff::NRRD, msg);
        self
    }
}

/// Alias for a `Result` with the crate's error type.
pub type Result<T> = ::std::result::Result<T, NrrdError>;

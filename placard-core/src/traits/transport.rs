//! Polled fetch transport trait
//!
//! The transport carries exactly one GET at a time. The caller drives
//! it by polling; each poll step returns the next transfer event
//! instead of invoking callbacks through an opaque context pointer, so
//! the single-in-flight invariant is held by the `&mut` borrow rather
//! than by convention.

/// One event from a poll step
#[derive(Debug, PartialEq, Eq)]
pub enum TransportEvent<'a> {
    /// The complete response header block (up to the blank line)
    Headers(&'a [u8]),
    /// One chunk of response body
    Body(&'a [u8]),
    /// Transfer finished; `status` is the server's HTTP status code
    Complete { status: u16 },
    /// Nothing arrived within the transport's bounded wait (~1 s)
    Idle,
}

/// Trait for the polled HTTP-style transport
pub trait SyncTransport {
    type Error: core::fmt::Debug;

    /// Start a GET for `path` on the configured sync server
    ///
    /// Only one transfer may be in flight; starting a new one while a
    /// previous transfer is unfinished discards the previous transfer.
    async fn request(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Drive the in-flight transfer and return the next event
    ///
    /// Blocks for at most the transport's bounded wait, returning
    /// [`TransportEvent::Idle`] when nothing arrived. A transport-level
    /// failure (connection reset, DNS failure) is an `Err`.
    async fn poll(&mut self) -> Result<TransportEvent<'_>, Self::Error>;
}

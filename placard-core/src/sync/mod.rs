//! Conditional image synchronization
//!
//! One fetch per screen per cycle: build a conditional request with the
//! screen's cache tag, stream the response into a bounded buffer via
//! the polled transport, and classify the result.

pub mod buffer;
pub mod client;
pub mod fetch;
pub mod request;

pub use buffer::ImageBuffer;
pub use client::{ImageSyncClient, FETCH_POLL_BUDGET};
pub use fetch::{FetchOutcome, FetchSession};
pub use request::RequestPath;

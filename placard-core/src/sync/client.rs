//! Image sync client
//!
//! Drives one conditional fetch at a time over the polled transport.
//! The transport's bounded wait (~1 s per poll step) times an overall
//! deadline: an attempt that has not completed within
//! [`FETCH_POLL_BUDGET`] poll steps is classified as an error instead
//! of stalling the device forever.

use log::{info, warn};

use super::buffer::ImageBuffer;
use super::fetch::{FetchOutcome, FetchSession};
use super::request::RequestPath;
use crate::tag::CacheTag;
use crate::traits::{SyncTransport, TransportEvent};

/// Maximum poll steps per fetch attempt (~2 minutes at the transport's
/// 1 s bounded wait)
pub const FETCH_POLL_BUDGET: u32 = 120;

/// The conditional image-fetch client
pub struct ImageSyncClient<T> {
    transport: T,
    device_id: heapless::String<16>,
}

impl<T: SyncTransport> ImageSyncClient<T> {
    pub fn new(transport: T, device_id: heapless::String<16>) -> Self {
        Self {
            transport,
            device_id,
        }
    }

    /// Fetch one screen's image
    ///
    /// Resets the buffer cursor, issues the conditional request, and
    /// drives the transport until completion or budget exhaustion.
    /// On [`FetchOutcome::NewImage`] the buffer holds the full payload;
    /// `tag` is updated in place whenever the response supplies one.
    pub async fn fetch(
        &mut self,
        screen_id: u8,
        tag: &mut CacheTag,
        write_count: u32,
        buffer: &mut ImageBuffer<'_>,
    ) -> FetchOutcome {
        buffer.reset();

        let path = RequestPath::build(screen_id, &self.device_id, write_count, tag);
        info!("fetching {}", path.as_str());

        let mut session = FetchSession::new(tag);

        if let Err(e) = self.transport.request(path.as_str()).await {
            warn!("error starting fetch: {:?}", e);
            return FetchOutcome::Error;
        }

        let mut polls = 0u32;
        // A failed attempt stops driving the transport immediately;
        // the remaining transfer bytes have nowhere to go.
        while !session.is_complete() && !session.has_failed() {
            if polls >= FETCH_POLL_BUDGET {
                warn!("fetch deadline exceeded after {} polls", polls);
                session.on_transport_failure();
                break;
            }
            polls += 1;

            match self.transport.poll().await {
                Ok(TransportEvent::Headers(headers)) => session.on_headers(headers),
                Ok(TransportEvent::Body(chunk)) => session.on_body(chunk, buffer),
                Ok(TransportEvent::Complete { status }) => session.on_complete(status),
                Ok(TransportEvent::Idle) => {}
                Err(e) => {
                    warn!("transport failure: {:?}", e);
                    session.on_transport_failure();
                }
            }
        }

        session.outcome(buffer)
    }
}

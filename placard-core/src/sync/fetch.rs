//! Fetch session state and outcome classification

use log::warn;

use super::buffer::ImageBuffer;
use crate::tag::CacheTag;

/// Header marker carrying the cache tag
const TAG_MARKER: &[u8] = b"etag:";

/// Result of one image fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchOutcome {
    /// Full payload received; the image buffer holds the new image
    NewImage,
    /// Server confirmed no change since the supplied tag
    Unchanged,
    /// Network failure, bad status, or short/over read
    Error,
}

/// Transient per-attempt fetch state
///
/// Lives for exactly one fetch call; holds the screen's current cache
/// tag and updates it in place when a response header supplies a fresh
/// one.
#[derive(Debug)]
pub struct FetchSession<'t> {
    tag: &'t mut CacheTag,
    complete: bool,
    failed: bool,
    status: u16,
}

impl<'t> FetchSession<'t> {
    pub fn new(tag: &'t mut CacheTag) -> Self {
        Self {
            tag,
            complete: false,
            failed: false,
            status: 0,
        }
    }

    /// Extract the cache tag from the raw response header block
    ///
    /// Scans for the tag marker case-insensitively, takes the value up
    /// to the line terminator, and stores it in the session's tag. A
    /// missing marker or terminator logs a warning and leaves the tag
    /// untouched, as does an oversize value (never truncated).
    pub fn on_headers(&mut self, headers: &[u8]) {
        let Some(start) = find_marker(headers) else {
            warn!("tag header not found in response");
            return;
        };

        let value = &headers[start..];
        let Some(end) = value.windows(2).position(|w| w == b"\r\n") else {
            warn!("end of tag header not found");
            return;
        };

        let raw = trim_ascii_space(&value[..end]);
        let Ok(text) = core::str::from_utf8(raw) else {
            warn!("tag header is not valid UTF-8, ignoring");
            return;
        };
        match CacheTag::try_from_str(text) {
            Ok(tag) => *self.tag = tag,
            Err(_) => warn!("tag header value too long, ignoring"),
        }
    }

    /// Absorb one body chunk into the image buffer
    ///
    /// A chunk that cannot be absorbed at all (buffer already full)
    /// fails the attempt: the server is sending more than one image's
    /// worth of data.
    pub fn on_body(&mut self, chunk: &[u8], buffer: &mut ImageBuffer<'_>) {
        if chunk.is_empty() {
            return;
        }
        let copied = buffer.absorb(chunk);
        if copied == 0 {
            warn!("image buffer full with body bytes remaining");
            self.failed = true;
        }
    }

    /// Record transfer completion and the server status
    pub fn on_complete(&mut self, status: u16) {
        self.complete = true;
        self.status = status;
    }

    /// Record a transport-level failure
    pub fn on_transport_failure(&mut self) {
        self.complete = true;
        self.failed = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the attempt has already failed (overrun or transport
    /// failure)
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Classify the finished attempt
    ///
    /// Status 200 requires the buffer cursor to land exactly on
    /// capacity; a short or over read is an error, never a new image.
    pub fn outcome(&self, buffer: &ImageBuffer<'_>) -> FetchOutcome {
        if self.failed {
            return FetchOutcome::Error;
        }

        match self.status {
            200 => {
                if buffer.is_full() {
                    FetchOutcome::NewImage
                } else {
                    warn!(
                        "image incomplete: {} of {} bytes received",
                        buffer.written(),
                        buffer.capacity()
                    );
                    FetchOutcome::Error
                }
            }
            304 => FetchOutcome::Unchanged,
            status => {
                warn!("fetch failed with status {}", status);
                FetchOutcome::Error
            }
        }
    }
}

/// Locate the byte just past the tag marker, matching case-insensitively
fn find_marker(headers: &[u8]) -> Option<usize> {
    headers
        .windows(TAG_MARKER.len())
        .position(|w| w.eq_ignore_ascii_case(TAG_MARKER))
        .map(|pos| pos + TAG_MARKER.len())
}

fn trim_ascii_space(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_tag(headers: &[u8]) -> CacheTag {
        let mut tag = CacheTag::empty();
        let mut session = FetchSession::new(&mut tag);
        session.on_headers(headers);
        tag
    }

    #[test]
    fn test_header_tag_extracted() {
        let tag = session_tag(b"HTTP/1.1 200 OK\r\nETag: abc123\r\n\r\n");
        assert_eq!(tag.as_str(), "abc123");
    }

    #[test]
    fn test_header_matching_is_case_insensitive() {
        let tag = session_tag(b"HTTP/1.1 304 Not Modified\r\netag: def456\r\n\r\n");
        assert_eq!(tag.as_str(), "def456");
    }

    #[test]
    fn test_missing_marker_keeps_old_tag() {
        let mut tag = CacheTag::try_from_str("old").unwrap();
        let mut session = FetchSession::new(&mut tag);
        session.on_headers(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
        assert_eq!(tag.as_str(), "old");
    }

    #[test]
    fn test_missing_terminator_keeps_old_tag() {
        let mut tag = CacheTag::try_from_str("old").unwrap();
        let mut session = FetchSession::new(&mut tag);
        session.on_headers(b"ETag: truncated");
        assert_eq!(tag.as_str(), "old");
    }

    #[test]
    fn test_oversize_value_ignored_not_truncated() {
        let mut headers = b"ETag: ".to_vec();
        headers.extend(std::iter::repeat(b'a').take(41));
        headers.extend(b"\r\n");
        let mut tag = CacheTag::try_from_str("old").unwrap();
        let mut session = FetchSession::new(&mut tag);
        session.on_headers(&headers);
        assert_eq!(tag.as_str(), "old");
    }

    #[test]
    fn test_status_200_full_buffer_is_new_image() {
        let mut backing = [0u8; 4];
        let mut buffer = ImageBuffer::new(&mut backing);
        let mut tag = CacheTag::empty();
        let mut session = FetchSession::new(&mut tag);

        session.on_body(&[1, 2, 3, 4], &mut buffer);
        session.on_complete(200);
        assert_eq!(session.outcome(&buffer), FetchOutcome::NewImage);
    }

    #[test]
    fn test_status_200_short_read_is_error() {
        let mut backing = [0u8; 4];
        let mut buffer = ImageBuffer::new(&mut backing);
        let mut tag = CacheTag::empty();
        let mut session = FetchSession::new(&mut tag);

        session.on_body(&[1, 2], &mut buffer);
        session.on_complete(200);
        assert_eq!(session.outcome(&buffer), FetchOutcome::Error);
    }

    #[test]
    fn test_status_304_is_unchanged_and_leaves_buffer_alone() {
        let mut backing = [7u8; 4];
        let mut buffer = ImageBuffer::new(&mut backing);
        let mut tag = CacheTag::try_from_str("abc").unwrap();
        let mut session = FetchSession::new(&mut tag);

        session.on_complete(304);
        assert_eq!(session.outcome(&buffer), FetchOutcome::Unchanged);
        assert_eq!(buffer.written(), 0);
        drop(session);
        assert_eq!(tag.as_str(), "abc");
        drop(buffer);
        assert_eq!(backing, [7u8; 4]);
    }

    #[test]
    fn test_other_status_is_error() {
        let mut backing = [0u8; 4];
        let buffer = ImageBuffer::new(&mut backing);
        let mut tag = CacheTag::empty();
        let mut session = FetchSession::new(&mut tag);
        session.on_complete(500);
        assert_eq!(session.outcome(&buffer), FetchOutcome::Error);
    }

    #[test]
    fn test_overrun_fails_attempt() {
        let mut backing = [0u8; 2];
        let mut buffer = ImageBuffer::new(&mut backing);
        let mut tag = CacheTag::empty();
        let mut session = FetchSession::new(&mut tag);

        session.on_body(&[1, 2], &mut buffer);
        session.on_body(&[3], &mut buffer);
        session.on_complete(200);
        assert_eq!(session.outcome(&buffer), FetchOutcome::Error);
    }

    #[test]
    fn test_transport_failure_is_error() {
        let mut backing = [0u8; 2];
        let buffer = ImageBuffer::new(&mut backing);
        let mut tag = CacheTag::empty();
        let mut session = FetchSession::new(&mut tag);
        session.on_transport_failure();
        assert_eq!(session.outcome(&buffer), FetchOutcome::Error);
    }
}

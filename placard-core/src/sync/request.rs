//! Request path construction

use heapless::String;

use crate::tag::CacheTag;

/// Maximum encoded path length
///
/// `/images/N` plus a 16-character device id, a 10-digit write counter
/// and a 40-character tag fits comfortably.
pub const MAX_PATH_LEN: usize = 160;

/// One fetch request path
///
/// `/images/{screen}?device_id={id}&saved_state_writes={count}[&etag={tag}]`
///
/// The write counter lets the server notice a counter mismatch (a
/// device that lost its saved state); the tag carries the conditional
/// check. The transport exposes no custom request headers, so the
/// conditional check rides as a query argument instead of an
/// `If-None-Match` header.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestPath(String<MAX_PATH_LEN>);

impl RequestPath {
    /// Build the path for one screen's fetch
    pub fn build(screen_id: u8, device_id: &str, write_count: u32, tag: &CacheTag) -> Self {
        use core::fmt::Write;

        let mut path = String::new();
        // The bound above covers every field; a formatting overflow
        // would only drop the tail of the tag, and the server treats an
        // unknown tag as a plain unconditional fetch.
        let _ = write!(
            path,
            "/images/{}?device_id={}&saved_state_writes={}",
            screen_id, device_id, write_count
        );
        if !tag.is_empty() {
            let _ = write!(path, "&etag={}", tag.as_str());
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_without_tag() {
        let path = RequestPath::build(2, "e6605c2f8a10b37c", 7, &CacheTag::empty());
        assert_eq!(
            path.as_str(),
            "/images/2?device_id=e6605c2f8a10b37c&saved_state_writes=7"
        );
    }

    #[test]
    fn test_path_with_tag() {
        let tag = CacheTag::try_from_str("bab545bf").unwrap();
        let path = RequestPath::build(1, "dev", 12, &tag);
        assert_eq!(
            path.as_str(),
            "/images/1?device_id=dev&saved_state_writes=12&etag=bab545bf"
        );
    }

    #[test]
    fn test_longest_fields_fit() {
        let tag = CacheTag::try_from_str(&"f".repeat(40)).unwrap();
        let path = RequestPath::build(3, "0123456789abcdef", u32::MAX, &tag);
        assert!(path.as_str().ends_with(&"f".repeat(40)));
    }
}

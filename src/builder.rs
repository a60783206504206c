//! Part construction
//!
//! Mirrors the teacher's `Part::new`: reads one header block and derives
//! the handful of facts the parser needs up front (is this multipart? is
//! this a message/rfc822 container? what's the boundary?). Where the
//! teacher returns a single `Part` struct, this picks a [`PartKind`] and a
//! [`ChildStrategy`] - the tagged-sum replacement for the spec's
//! `PartFactories` dispatch.
use crate::arena::{ChildStrategy, PartKind, PartNode};
use crate::header::{read_header_block, HeaderContainer};
use crate::source::ByteSource;

/// Reads headers starting at the source's current position and builds the
/// corresponding node, leaving the cursor at the first byte of content
pub(crate) fn build_node(source: &mut ByteSource, child_of_digest: bool) -> PartNode {
    let header_start = source.tell();
    let headers = read_header_block(source);
    let mut container = HeaderContainer::new();
    let mut malformed_header = false;
    for h in headers {
        if !h.valid {
            malformed_header = true;
            continue;
        }
        container.push(h);
    }
    let content_start = source.tell();

    let content_type = container
        .get("content-type")
        .map(|h| h.value.as_str())
        .unwrap_or(if child_of_digest {
            "message/rfc822"
        } else {
            "text/plain"
        });

    let boundary = container
        .get("content-type")
        .filter(|h| h.value.starts_with("multipart/"))
        .and_then(|h| h.get_param("boundary"))
        .filter(|b| !b.is_empty())
        .map(|b| b.as_bytes().to_vec());

    let (kind, strategy) = if let Some(boundary) = boundary {
        (PartKind::Mime, ChildStrategy::MimeBoundary(boundary))
    } else if content_type == "message/rfc822" || content_type.starts_with("message/rfc822") {
        (PartKind::Message, ChildStrategy::MessageRfc822)
    } else {
        (PartKind::Mime, ChildStrategy::None)
    };

    let malformed_boundary = container
        .get("content-type")
        .is_some_and(|h| h.value.starts_with("multipart/"))
        && matches!(strategy, ChildStrategy::None);

    PartNode {
        kind,
        parent: None,
        children: Vec::new(),
        headers: container,
        uu_mode: None,
        uu_filename: None,
        header_start,
        content_start,
        content_end: None,
        strategy,
        all_parts_parsed: false,
        preamble: Vec::new(),
        epilogue: Vec::new(),
        malformed_header,
        malformed_boundary,
        truncated: false,
        content_override: None,
        headers_dirty: false,
        structure_dirty: false,
        delivered: 0,
    }
}

/// Builds the root node for input that has no recognizable MIME structure
/// at all (no `Content-Type` header, or a message that fails basic
/// RFC 5322 shape). The resulting node is a `NonMime` part whose body is
/// later scanned for uuencode stanzas.
pub(crate) fn build_nonmime_root(source: &mut ByteSource) -> PartNode {
    let mut node = build_node(source, false);
    node.kind = PartKind::NonMime;
    node.strategy = ChildStrategy::UuEncodeScan;
    node
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_leaf() {
        let mut src = ByteSource::new(b"Subject: hi\r\n\r\nbody".as_slice());
        let node = build_node(&mut src, false);
        assert_eq!(node.kind, PartKind::Mime);
        assert!(matches!(node.strategy, ChildStrategy::None));
        assert_eq!(src.tell(), node.content_start);
    }

    #[test]
    fn test_build_multipart() {
        let mut src = ByteSource::new(
            b"Content-Type: multipart/mixed; boundary=XYZ\r\n\r\n--XYZ\r\n".as_slice(),
        );
        let node = build_node(&mut src, false);
        assert_eq!(node.kind, PartKind::Mime);
        assert!(matches!(node.strategy, ChildStrategy::MimeBoundary(_)));
    }

    #[test]
    fn test_build_message_rfc822() {
        let mut src = ByteSource::new(b"Content-Type: message/rfc822\r\n\r\nFrom: a@b\r\n".as_slice());
        let node = build_node(&mut src, false);
        assert_eq!(node.kind, PartKind::Message);
        assert!(matches!(node.strategy, ChildStrategy::MessageRfc822));
    }
}

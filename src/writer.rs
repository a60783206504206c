//! Re-emission of a (possibly mutated) message back to bytes
//!
//! The spec's `MessageWriter` copies unmutated regions verbatim and only
//! re-serializes what changed. Since every node's content range is
//! contiguous with its whole subtree (headers through closing boundary),
//! an entirely untouched subtree is a single byte-for-byte copy out of
//! the original [`crate::source::ByteSource`]; only nodes under a
//! mutation get their headers (and, if overridden, their content)
//! regenerated.
use crate::arena::{Arena, ChildStrategy, PartId};
use crate::header::Header;
use crate::source::ByteSource;

const FOLD_COLUMN: usize = 78;

fn subtree_is_dirty(arena: &Arena, id: PartId) -> bool {
    if arena[id].headers_dirty || arena[id].content_override.is_some() || arena[id].structure_dirty {
        return true;
    }
    arena[id].children.iter().any(|&c| subtree_is_dirty(arena, c))
}

fn fold_header(name: &str, value: &str) -> String {
    let mut out = String::new();
    let prefix = format!("{name}: ");
    let mut col = prefix.len();
    out.push_str(&prefix);
    for (i, word) in value.split(' ').enumerate() {
        if i > 0 {
            if col + 1 + word.len() > FOLD_COLUMN && col > prefix.len() {
                out.push_str("\r\n ");
                col = 1;
            } else {
                out.push(' ');
                col += 1;
            }
        }
        out.push_str(word);
        col += word.len();
    }
    out.push_str("\r\n");
    out
}

fn serialize_header(h: &Header) -> String {
    let mut value = h.value.clone();
    for (k, v) in &h.params {
        if v.is_empty() {
            value.push_str(&format!("; {k}"));
        } else if v.contains(' ') || v.contains(';') || v.contains('"') {
            value.push_str(&format!("; {k}=\"{}\"", v.replace('"', "\\\"")));
        } else {
            value.push_str(&format!("; {k}={v}"));
        }
    }
    fold_header(&h.name, &value)
}

/// Re-serializes `id` and its whole subtree into `out`
fn write_node(arena: &Arena, source: &ByteSource, id: PartId, out: &mut Vec<u8>) {
    if !subtree_is_dirty(arena, id) {
        let start = arena[id].header_start;
        let end = arena[id].content_end.unwrap_or(start);
        out.extend_from_slice(source.read_range(start..end));
        return;
    }

    if arena[id].headers_dirty {
        for h in arena[id].headers.iter() {
            out.extend_from_slice(serialize_header(h).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
    } else {
        let start = arena[id].header_start;
        out.extend_from_slice(source.read_range(start..arena[id].content_start));
    }

    if let Some(content) = &arena[id].content_override {
        out.extend_from_slice(content);
        return;
    }

    match &arena[id].strategy {
        ChildStrategy::MimeBoundary(boundary) => {
            out.extend_from_slice(&arena[id].preamble);
            for &child in &arena[id].children {
                out.extend_from_slice(b"--");
                out.extend_from_slice(boundary);
                out.extend_from_slice(b"\r\n");
                write_node(arena, source, child, out);
            }
            out.extend_from_slice(b"--");
            out.extend_from_slice(boundary);
            out.extend_from_slice(b"--\r\n");
            out.extend_from_slice(&arena[id].epilogue);
        }
        ChildStrategy::MessageRfc822 => {
            if let Some(&child) = arena[id].children.first() {
                write_node(arena, source, child, out);
            }
        }
        ChildStrategy::UuEncodeScan | ChildStrategy::None => {
            let start = arena[id].content_start;
            let end = arena[id].content_end.unwrap_or(start);
            out.extend_from_slice(source.read_range(start..end));
        }
    }
}

/// Serializes the whole message tree rooted at `root`
pub(crate) fn write(arena: &Arena, source: &ByteSource, root: PartId) -> Vec<u8> {
    let mut out = Vec::new();
    write_node(arena, source, root, &mut out);
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fold_header_short() {
        let s = fold_header("Subject", "hello world");
        assert_eq!(s, "Subject: hello world\r\n");
    }

    #[test]
    fn test_fold_header_wraps_long_value() {
        let long = "word ".repeat(30);
        let s = fold_header("X-Long", long.trim());
        assert!(s.contains("\r\n "));
    }
}

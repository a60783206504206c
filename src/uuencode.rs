//! Uuencode stanza scanning and decoding
//!
//! A non-MIME message may still carry one or more classic `begin`/`end`
//! uuencoded attachments inline in its body. This module finds those
//! stanzas and turns each into a `UuEncoded` [`crate::arena::PartNode`]
//! whose `uu_mode`/`uu_filename` stand in for the headers a MIME part
//! would have had.
use crate::arena::{ChildStrategy, PartKind, PartNode};
use crate::header::HeaderContainer;
use regex::bytes::Regex;
use std::ops::Range;

/// One line's offset range within the scanned buffer, terminator included
struct LineSpan {
    range: Range<usize>,
}

fn split_lines(buf: &[u8], base: usize) -> Vec<LineSpan> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < buf.len() {
        if buf[i] == b'\n' {
            out.push(LineSpan {
                range: (base + start)..(base + i + 1),
            });
            start = i + 1;
        } else if buf[i] == b'\r' && buf.get(i + 1) != Some(&b'\n') {
            out.push(LineSpan {
                range: (base + start)..(base + i + 1),
            });
            start = i + 1;
        }
        i += 1;
    }
    if start < buf.len() {
        out.push(LineSpan {
            range: (base + start)..(base + buf.len()),
        });
    }
    out
}

fn without_eol(line: &[u8]) -> &[u8] {
    let mut l = line;
    while matches!(l.last(), Some(b'\r') | Some(b'\n')) {
        l = &l[..l.len() - 1];
    }
    l
}

fn gap_node(start: usize, end: usize) -> PartNode {
    PartNode {
        kind: PartKind::NonMime,
        parent: None,
        children: Vec::new(),
        headers: HeaderContainer::new(),
        uu_mode: None,
        uu_filename: None,
        header_start: start,
        content_start: start,
        content_end: Some(end),
        strategy: ChildStrategy::None,
        all_parts_parsed: true,
        preamble: Vec::new(),
        epilogue: Vec::new(),
        malformed_header: false,
        malformed_boundary: false,
        truncated: false,
        content_override: None,
        headers_dirty: false,
        structure_dirty: false,
        delivered: 0,
    }
}

/// Scans `buf` (the bytes at offset `base` in the original message) for
/// `begin MODE FILENAME` ... `end` stanzas, returning one `UuEncoded` node
/// per stanza found plus a plain `NonMime` node for any non-empty stretch
/// of surrounding text (leading, trailing, or between two stanzas), all in
/// document order
pub(crate) fn scan(buf: &[u8], base: usize) -> Vec<PartNode> {
    lazy_static::lazy_static! {
        static ref BEGIN_RE: Regex =
            Regex::new(r"(?-u)^begin\s+([0-7]{3,4})\s+(\S.*)$").unwrap();
    }
    let lines = split_lines(buf, base);
    let mut parts = Vec::new();
    let mut cursor = base;
    let mut i = 0;
    while i < lines.len() {
        let line_bytes = &buf[(lines[i].range.start - base)..(lines[i].range.end - base)];
        let trimmed = without_eol(line_bytes);
        if let Some(caps) = BEGIN_RE.captures(trimmed) {
            let stanza_start = lines[i].range.start;
            if stanza_start > cursor {
                parts.push(gap_node(cursor, stanza_start));
            }
            let mode = std::str::from_utf8(&caps[1])
                .ok()
                .and_then(|s| u32::from_str_radix(s, 8).ok());
            let filename = String::from_utf8_lossy(&caps[2]).to_string();
            let content_start = lines[i].range.end;
            let mut j = i + 1;
            let mut content_end = content_start;
            while j < lines.len() {
                let body = &buf[(lines[j].range.start - base)..(lines[j].range.end - base)];
                if without_eol(body) == b"end" {
                    break;
                }
                content_end = lines[j].range.end;
                j += 1;
            }
            let truncated = j >= lines.len();
            cursor = if truncated { content_end } else { lines[j].range.end };
            parts.push(PartNode {
                kind: PartKind::UuEncoded,
                parent: None,
                children: Vec::new(),
                headers: HeaderContainer::new(),
                uu_mode: mode,
                uu_filename: Some(filename),
                header_start: lines[i].range.start,
                content_start,
                content_end: Some(content_end),
                strategy: ChildStrategy::None,
                all_parts_parsed: true,
                preamble: Vec::new(),
                epilogue: Vec::new(),
                malformed_header: false,
                malformed_boundary: false,
                truncated,
                content_override: None,
                headers_dirty: false,
                structure_dirty: false,
                delivered: 0,
            });
            i = (j + 1).min(lines.len()).max(i + 1);
            continue;
        }
        i += 1;
    }
    let end = base + buf.len();
    if end > cursor {
        parts.push(gap_node(cursor, end));
    }
    parts
}

/// Decodes one classic-uuencode line (length byte followed by packed data)
fn decode_line(line: &[u8]) -> Vec<u8> {
    if line.is_empty() {
        return Vec::new();
    }
    let n = ((line[0] as i32 - 0x20) & 0x3f) as usize;
    let sixbits: Vec<u8> = line[1..]
        .iter()
        .map(|&c| ((c as i32 - 0x20) & 0x3f) as u8)
        .collect();
    let mut out = Vec::with_capacity(n);
    for chunk in sixbits.chunks(4) {
        if chunk.len() < 2 {
            break;
        }
        let c0 = chunk[0];
        let c1 = chunk[1];
        let c2 = *chunk.get(2).unwrap_or(&0);
        let c3 = *chunk.get(3).unwrap_or(&0);
        let bytes = [(c0 << 2) | (c1 >> 4), (c1 << 4) | (c2 >> 2), (c2 << 6) | c3];
        for b in bytes {
            if out.len() < n {
                out.push(b);
            }
        }
    }
    out
}

/// Decodes a whole uuencoded stanza's body (the encoded lines between
/// `begin` and `end`, as raw bytes including line terminators)
pub(crate) fn decode(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for span in split_lines(raw, 0) {
        let line = without_eol(&raw[span.range.clone()]);
        if line.is_empty() || line == b"`" {
            continue;
        }
        out.extend(decode_line(line));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scan_single_stanza() {
        let data = b"some text\nbegin 644 greeting.txt\n#:&5L;&\\`\nend\nmore text\n";
        let parts = scan(data, 0);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].kind, PartKind::NonMime);
        assert_eq!(parts[1].uu_mode, Some(0o644));
        assert_eq!(parts[1].uu_filename.as_deref(), Some("greeting.txt"));
        assert_eq!(parts[2].kind, PartKind::NonMime);
    }

    #[test]
    fn test_scan_stanza_without_surrounding_text() {
        let data = b"begin 644 greeting.txt\n#:&5L;&\\`\nend\n";
        let parts = scan(data, 0);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind, PartKind::UuEncoded);
    }

    #[test]
    fn test_decode_line_roundtrip() {
        // "cat" => length 3, then packed base
        let encoded = encode_for_test(b"cat");
        let decoded = decode_line(&encoded);
        assert_eq!(decoded, b"cat");
    }

    fn encode_for_test(data: &[u8]) -> Vec<u8> {
        let mut out = vec![(data.len() as u8) + 0x20];
        for chunk in data.chunks(3) {
            let mut buf = [0u8; 3];
            buf[..chunk.len()].copy_from_slice(chunk);
            let c0 = buf[0] >> 2;
            let c1 = ((buf[0] << 4) | (buf[1] >> 4)) & 0x3f;
            let c2 = ((buf[1] << 2) | (buf[2] >> 6)) & 0x3f;
            let c3 = buf[2] & 0x3f;
            for c in [c0, c1, c2, c3] {
                let ch = if c == 0 { 0x60 } else { c + 0x20 };
                out.push(ch);
            }
        }
        out
    }
}

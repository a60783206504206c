//! Content-Transfer-Encoding codecs
//!
//! These are pure, allocation-based transforms over whole buffers or
//! line-sized chunks; [`crate::streams`] wraps them into `Read` adapters so
//! callers can pull decoded bytes lazily instead of having them pushed into
//! a sink, since this library never owns an output stream the way the
//! teacher's worker did.
use lazy_static::lazy_static;
use regex::bytes::{Captures as BinCaptures, Regex as BinRegex};
use std::borrow::Cow;

static QLUT: &[u8] = &[
    0x00, 0x01, 0x02, 0x03, 0x04, 0x5, 0x06, 0x07, 0x08, 0x09, // 0-9
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // :;<=>?@
    0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, // A-F
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // G-P
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // Q-Z
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // [\]^_`
    0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f, // a-f
];

/// Decodes a RFC 2047 header value Q-encoded portion (similar to *quoted-printable*)
///
/// Note: RFC 2047 is very strict about Q, however MUAs are forgiving; this decoder
/// tolerates invalid encodings but flags them
pub(crate) fn decode_q(enc: &[u8]) -> (Cow<'_, [u8]>, bool) {
    lazy_static! {
        static ref RE: BinRegex = BinRegex::new(r"(?-u)(_)|(?:=([0-9A-Fa-f][0-9A-Fa-f]))").unwrap();
    }
    let mut ugly = enc.contains(&b' ');
    let ret = RE.replace_all(enc, |caps: &BinCaptures| {
        if caps.get(2).is_none() {
            [b' ']
        } else {
            let hi = QLUT[(caps[2][0] - b'0') as usize];
            let lo = QLUT[(caps[2][1] - b'0') as usize];
            ugly |= ((hi | lo) & 0x10) != 0;
            [((hi & 0xf) << 4) | (lo & 0xf)]
        }
    });
    (ret, ugly)
}

/// Decodes a *quoted-printable* encoded MIME part body
///
/// This is an intentionally lax parser
pub(crate) fn decode_quoted_printable(enc: &[u8]) -> (Cow<'_, [u8]>, bool) {
    lazy_static! {
        static ref RE: BinRegex = BinRegex::new(r"(?-u)=([0-9A-Fa-f][0-9A-Fa-f])").unwrap();
    }
    let mut ugly = false;
    let ret = RE.replace_all(enc, |caps: &BinCaptures| {
        let hi = QLUT[(caps[1][0] - b'0') as usize];
        let lo = QLUT[(caps[1][1] - b'0') as usize];
        ugly |= ((hi | lo) & 0x10) != 0;
        [((hi & 0xf) << 4) | (lo & 0xf)]
    });
    (ret, ugly)
}

#[rustfmt::skip]
static B64LUT: &[u8] = &[
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 0-15
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 16-31
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,  62, 255, 255, 255,  63, // 31-47
     52,  53,  54,  55,  56,  57,  58,  59,  60,  61, 255, 255, 255,  64, 255, 255, // 48-63
    255,   0,   1,   2,   3,   4,   5,   6,   7,   8,   9,  10,  11,  12,  13,  14, // 64-79
     15,  16,  17,  18,  19,  20,  21,  22,  23,  24,  25, 255, 255, 255, 255, 255, // 80-95
    255,  26,  27,  28,  29,  30,  31,  32,  33,  34,  35,  36,  37,  38,  39,  40, // 96-111
     41,  42,  43,  44,  45,  46,  47,  48,  49,  50,  51, 255, 255, 255, 255, 255, // 112-127

    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 128-143
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 144-159
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 160-175
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 176-191
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 192-207
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 208-223
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 224-239
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, // 240-255
];

fn decode_base64_chunk(chunk: &[u8], dec: &mut Vec<u8>) -> Option<bool> {
    let mut has_padding = false;
    let b1 = B64LUT[chunk[0] as usize];
    let b2 = B64LUT[chunk[1] as usize];
    let b3 = B64LUT[chunk[2] as usize];
    let b4 = B64LUT[chunk[3] as usize];
    if (b1 | b2 | b3 | b4) & 0b1000_0000 != 0 {
        return None;
    }
    if (b1 | b2) & (1 << 6) != 0 {
        return None;
    }
    let out: [u8; 3] = [(b1 << 2) | (b2 >> 4), (b2 << 4) | (b3 >> 2), (b3 << 6) | b4];
    if b4 & 0b0100_0000 != 0 {
        has_padding = true;
        if b3 & 0b0100_0000 != 0 {
            dec.push(out[0]);
        } else {
            dec.extend_from_slice(&out[0..2]);
        }
    } else if b3 & (1 << 6) != 0 {
        return None;
    } else {
        dec.extend_from_slice(&out);
    }
    Some(has_padding)
}

/// Decodes a RFC 2047 header value B-encoded portion (i.e. *base64*)
///
/// Note: this parser is strict
pub(crate) fn decode_b(enc: &str) -> Option<Vec<u8>> {
    // A rather picky decoder, except for padding
    let mut ret: Vec<u8> = Vec::with_capacity(enc.len() / 4 * 3);
    let mut chunks = enc.as_bytes().chunks_exact(4);
    let mut padding_seen = false;
    for chunk in chunks.by_ref() {
        if padding_seen {
            return None;
        }
        padding_seen = decode_base64_chunk(chunk, &mut ret)?;
    }
    let reminder = chunks.remainder();
    if !reminder.is_empty() {
        if padding_seen || reminder.len() < 2 {
            return None;
        }
        let chunk: [u8; 4] = if reminder.len() == 2 {
            [reminder[0], reminder[1], b'=', b'=']
        } else {
            [reminder[0], reminder[1], reminder[2], b'=']
        };
        decode_base64_chunk(&chunk, &mut ret)?;
    }
    Some(ret)
}

/// Decodes a *base64* encoded MIME part body
///
/// This is an intentionally **extremely lax** parser: any char not in the
/// alphabet is silently discarded - this is in line with most MUAs.
/// `prev` carries up to 3 leftover bytes from a previous call (base64 is
/// decoded 4 input bytes at a time, and content arrives line by line).
pub(crate) fn decode_base64(enc: &[u8], prev: &[u8]) -> (Vec<u8>, Vec<u8>, bool) {
    assert!(prev.len() < 4);
    let mut ret: Vec<u8> = Vec::with_capacity((enc.len() / 4 + 1) * 3);
    let mut chunk = [0u8; 4];
    let mut pos = prev.len();
    let mut ugly = false;
    if pos > 0 {
        chunk[0..pos].copy_from_slice(prev);
    }
    for c in enc {
        if B64LUT[*c as usize] & 0b1000_0000 == 0 {
            chunk[pos] = *c;
            pos += 1;
            if pos == 4 {
                if decode_base64_chunk(&chunk, &mut ret).is_none() {
                    ugly = true;
                }
                pos = 0;
            }
        } else {
            ugly = true;
        }
    }
    (ret, chunk[0..pos].to_vec(), ugly)
}

/// Decodes a whole quoted-printable body given as raw (CRLF-containing)
/// lines, joining soft line breaks (`=` at end of line)
pub(crate) fn decode_quoted_printable_body(lines: impl Iterator<Item = Vec<u8>>) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    let mut ugly = false;
    for line in lines {
        let trimmed = crate::trim_wsp_end(crate::without_eol(&line));
        let (body, add_eol) = if let Some(stripped) = trimmed.strip_suffix(b"=") {
            (stripped, false)
        } else {
            (trimmed, true)
        };
        let (dec, u) = decode_quoted_printable(body);
        ugly |= u;
        out.extend_from_slice(&dec);
        if add_eol {
            out.push(b'\n');
        }
    }
    (out, ugly)
}

/// Decodes a whole base64 body given as raw lines
pub(crate) fn decode_base64_body(lines: impl Iterator<Item = Vec<u8>>) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    let mut carry = Vec::new();
    let mut ugly = false;
    for line in lines {
        let line = crate::without_eol(&line);
        let (dec, reminder, u) = decode_base64(line, &carry);
        ugly |= u;
        out.extend_from_slice(&dec);
        carry = reminder;
    }
    if carry.len() >= 2 {
        let mut chunk = [b'A'; 4];
        chunk[0..carry.len()].copy_from_slice(&carry);
        chunk[3] = b'=';
        if carry.len() == 2 {
            chunk[2] = b'=';
        }
        let mut dec = Vec::with_capacity(2);
        if decode_base64_chunk(&chunk, &mut dec).is_none() {
            ugly = true;
        }
        out.extend_from_slice(&dec);
    }
    (out, ugly)
}

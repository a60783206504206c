//! Lazy, mutable MIME part tree
//!
//! [`parse`] turns a whole mail message into a [`Message`]: a tree of
//! parts that starts out mostly unexpanded and grows on demand as the
//! caller asks for children, content or a full expansion. Parts can then
//! be inspected, filtered with [`PartFilter`], edited in place, and
//! re-serialized with [`Message::write`].

#![warn(missing_docs)]

mod arena;
mod builder;
mod charset;
mod decode;
pub mod error;
pub mod header;
mod parser;
mod source;
mod streams;
mod uuencode;
mod writer;

mod filter;

pub use arena::{PartId, PartKind};
pub use error::{Error, Result};
pub use filter::PartFilter;
pub use header::{Header, HeaderContainer};

use arena::{Arena, ChildStrategy};
use source::ByteSource;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const CRLF: &[u8] = &[CR, LF];
const WSP: &[u8] = &[b' ', b'\t'];

#[inline]
/// Removes a single CR, LF or CRLF from the end of the slice
fn without_eol(line: &[u8]) -> &[u8] {
    if line.ends_with(CRLF) {
        &line[0..(line.len() - 2)]
    } else if line.last().is_some_and(|c| CRLF.contains(c)) {
        &line[0..(line.len() - 1)]
    } else {
        line
    }
}

#[inline]
/// Removes whitespace from the beginning of the slice
fn trim_wsp_start(bytes: &[u8]) -> &[u8] {
    let mut ret = bytes;
    while let Some(v) = ret.first() {
        if WSP.contains(v) {
            ret = &ret[1..];
            continue;
        }
        break;
    }
    ret
}

#[inline]
/// Removes whitespace from the end of the slice
fn trim_wsp_end(bytes: &[u8]) -> &[u8] {
    let mut ret = bytes;
    while let Some(v) = ret.last() {
        if WSP.contains(v) {
            ret = &ret[0..(ret.len() - 1)];
            continue;
        }
        break;
    }
    ret
}

#[inline]
/// Removes whitespace from both sides of the slice
fn trim_wsp(bytes: &[u8]) -> &[u8] {
    trim_wsp_end(trim_wsp_start(bytes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The value of a part's `Content-Transfer-Encoding` header
pub enum TransferEncoding {
    /// The encoding was not recognized
    Unknown,
    /// 7bit
    SevenBit,
    /// 8bit
    EightBit,
    /// binary
    Binary,
    /// quoted-printable
    QuotedPrintable,
    /// base64
    Base64,
}

/// A lazily-parsed, mutable tree of MIME parts
///
/// Built by [`parse`]. Keeps the whole input in memory (see
/// [`source::ByteSource`]) so that parts can be re-read and the tree can
/// be walked out of order, unlike the teacher's forward-only streaming
/// reader.
pub struct Message {
    source: ByteSource,
    arena: Arena,
    root: PartId,
}

/// Read-only view of one part's headers and derived properties
///
/// Borrowed from a [`Message`]; never outlives it. Mirrors the teacher's
/// `Part` inspection methods (`content_type`, `is_text`, `charset`, ...)
/// but over a tree node instead of a standalone struct.
pub struct PartRef<'a> {
    message: &'a Message,
    id: PartId,
}

impl<'a> PartRef<'a> {
    /// The id this view was created from
    pub fn id(&self) -> PartId {
        self.id
    }

    /// The part's tagged kind
    pub fn kind(&self) -> &PartKind {
        &self.message.arena[self.id].kind
    }

    /// The part's parent, if any
    pub fn parent(&self) -> Option<PartId> {
        self.message.arena[self.id].parent
    }

    /// Currently discovered children, in document order
    ///
    /// For a lazily-parsed multipart part this may be a prefix of the
    /// true child list; call [`Message::next_child`] or
    /// [`Message::resolve`] to discover more.
    pub fn children(&self) -> &[PartId] {
        &self.message.arena[self.id].children
    }

    /// All headers, in original order
    pub fn headers(&self) -> &HeaderContainer {
        &self.message.arena[self.id].headers
    }

    /// The first header matching `name` (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&Header> {
        self.headers().get(name)
    }

    /// The part's `Content-Type` value, synthesizing the RFC 2045 default
    /// (`message/rfc822` for a digest child, `text/plain` otherwise) when
    /// the header is absent
    pub fn content_type(&self) -> Option<&str> {
        if matches!(self.kind(), PartKind::UuEncoded) {
            return None;
        }
        Some(
            self.get_header("content-type")
                .map(|h| h.value.as_str())
                .unwrap_or(match self.kind() {
                    PartKind::Message => "message/rfc822",
                    _ => "text/plain",
                }),
        )
    }

    /// Whether the part is declared as containing text
    pub fn is_text(&self) -> bool {
        self.content_type().is_some_and(|ct| ct.starts_with("text/"))
    }

    /// Whether the part is declared as `text/plain`
    pub fn is_text_plain(&self) -> bool {
        self.content_type() == Some("text/plain")
    }

    /// The part's charset, if it declares itself as text
    pub fn charset(&self) -> Option<&str> {
        if self.is_text() {
            Some(
                self.get_header("content-type")
                    .and_then(|h| h.get_param("charset"))
                    .unwrap_or("us-ascii"),
            )
        } else {
            None
        }
    }

    /// Whether this part is a `Mime` multipart container
    pub fn is_multipart(&self) -> bool {
        matches!(
            self.message.arena[self.id].strategy,
            ChildStrategy::MimeBoundary(_)
        )
    }

    /// The value of `Content-Disposition`, or `"inline"` if absent
    pub fn content_disposition(&self) -> &str {
        self.get_header("content-disposition")
            .map(|h| h.value.as_str())
            .unwrap_or("inline")
    }

    /// Whether the part is inline (as opposed to an attachment)
    pub fn is_inline(&self) -> bool {
        self.content_disposition() != "attachment"
    }

    /// The parsed `Content-Transfer-Encoding`
    pub fn transfer_encoding(&self) -> TransferEncoding {
        match self.content_transfer_encoding() {
            Some("7bit") => TransferEncoding::SevenBit,
            Some("8bit") => TransferEncoding::EightBit,
            Some("binary") => TransferEncoding::Binary,
            Some("quoted-printable") => TransferEncoding::QuotedPrintable,
            Some("base64") => TransferEncoding::Base64,
            Some(_) => TransferEncoding::Unknown,
            None => TransferEncoding::SevenBit,
        }
    }

    /// The raw value of `Content-Transfer-Encoding`
    pub fn content_transfer_encoding(&self) -> Option<&str> {
        self.get_header("content-transfer-encoding")
            .map(|h| h.value.as_str())
    }

    /// Checks if the part contains any unparsable header line
    pub fn has_invalid_headers(&self) -> bool {
        self.message.arena[self.id].malformed_header
    }

    /// Checks if a header name repeats
    pub fn has_duplicate_header(&self, name: &str) -> bool {
        self.headers().has_duplicate(name)
    }

    /// Checks if any *resent-* header is present
    pub fn is_resent(&self) -> bool {
        [
            "resent-date",
            "resent-from",
            "resent-sender",
            "resent-to",
            "resent-cc",
            "resent-bcc",
            "resent-msg-id",
        ]
        .iter()
        .any(|name| self.get_header(name).is_some())
    }

    /// Checks if any mailing-list header is present
    pub fn is_list(&self) -> bool {
        self.headers().iter().any(|h| h.value.starts_with("list-"))
    }

    /// The names this part is known by, in MUA preference order
    /// (`Content-Disposition: filename`, then `Content-Type: name`, then,
    /// for a `UuEncoded` part, the stanza's own filename)
    pub fn names(&self) -> Vec<String> {
        let node = &self.message.arena[self.id];
        let mut names: Vec<String> = node
            .headers
            .get_all("content-disposition")
            .flat_map(|h| &h.params)
            .filter(|(k, _)| k == "filename")
            .map(|(_, v)| v.clone())
            .chain(
                node.headers
                    .get_all("content-type")
                    .flat_map(|h| &h.params)
                    .filter(|(k, _)| k == "name")
                    .map(|(_, v)| v.clone()),
            )
            .collect();
        if let Some(name) = &node.uu_filename {
            names.push(name.clone());
        }
        names
    }

    /// Summarizes header flaws tolerated while parsing: name, value,
    /// encoding, missing-value params and inconsistent quoting
    pub fn collect_header_flaws(&self) -> (bool, bool, bool, bool, bool) {
        self.headers()
            .iter()
            .fold((false, false, false, false, false), |res, h| {
                (
                    res.0 | h.ugly_name,
                    res.1 | h.ugly_value,
                    res.2 | h.bad_encoding,
                    res.3 | h.naked_params,
                    res.4 | h.ugly_quotes,
                )
            })
    }

    /// True for an attachment that nonetheless declares a text `charset`
    /// - often a sign of malware disguised as a document
    pub fn is_attachment_with_charset(&self) -> bool {
        !self.is_inline()
            && self
                .get_header("content-type")
                .and_then(|h| h.get_param("charset"))
                .is_some()
    }

    /// Whether the boundary parsing for this part broke down (declared
    /// multipart but no usable boundary, or a malformed boundary line)
    pub fn has_malformed_boundary(&self) -> bool {
        self.message.arena[self.id].malformed_boundary
    }

    /// Whether this part's content ran off the end of the input before
    /// its expected terminator was found
    pub fn is_truncated(&self) -> bool {
        self.message.arena[self.id].truncated
    }

    /// The mode and filename synthesized for a `UuEncoded` part
    pub fn uu_info(&self) -> Option<(u32, &str)> {
        let node = &self.message.arena[self.id];
        Some((node.uu_mode?, node.uu_filename.as_deref()?))
    }

    /// Heuristic check for a PGP/SMIME signature leaf part
    pub fn is_signature_part(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            ct.starts_with("application/pgp-signature") || ct.starts_with("application/pkcs7-signature")
        })
    }
}

impl Message {
    /// The root part (the message itself)
    pub fn root(&self) -> PartId {
        self.root
    }

    /// A read-only view of `id`
    pub fn part(&self, id: PartId) -> PartRef<'_> {
        PartRef { message: self, id }
    }

    /// Discovers the next not-yet-seen child of `id`
    ///
    /// Returns `None` once every child has been found (normalizing the
    /// "exhausted" case rather than returning a sentinel boolean), and
    /// resolves the previously discovered child's own content first, per
    /// the "drain before advancing" rule.
    pub fn next_child(&mut self, id: PartId) -> Result<Option<PartId>> {
        parser::read_next_child(&mut self.arena, &mut self.source, id)
    }

    /// Forces full discovery of `id`'s subtree
    pub fn resolve(&mut self, id: PartId) -> Result<()> {
        parser::ensure_resolved(&mut self.arena, &mut self.source, id)?;
        if let Some(e) = parser::map_error_for_truncation(id, &self.arena) {
            tracing::warn!("{}", e);
        }
        Ok(())
    }

    /// Forces discovery of the whole tree, returning every part id in
    /// document (pre-)order
    pub fn expand_all(&mut self) -> Result<Vec<PartId>> {
        parser::expand_all(&mut self.arena, &mut self.source, self.root)?;
        let mut ids = Vec::with_capacity(self.arena.len());
        self.collect_ids(self.root, &mut ids);
        Ok(ids)
    }

    fn collect_ids(&self, id: PartId, out: &mut Vec<PartId>) {
        out.push(id);
        for &child in &self.arena[id].children {
            self.collect_ids(child, out);
        }
    }

    /// Finds every already- or newly-discovered part matching `filter`
    ///
    /// Forces a full expansion first, since a filter naturally wants to
    /// consider the whole tree.
    pub fn find_all(&mut self, filter: &PartFilter) -> Result<Vec<PartId>> {
        let root = self.root;
        self.get_all_parts(root, Some(filter))
    }

    /// The `index`-th part in depth-first pre-order under (and including)
    /// `id` that matches `filter`, discovering children lazily as needed
    ///
    /// `id` itself is candidate 0. `filter` of `None` matches everything.
    pub fn get_part(
        &mut self,
        id: PartId,
        index: usize,
        filter: Option<&PartFilter>,
    ) -> Result<Option<PartId>> {
        let mut matched = 0;
        self.get_part_rec(id, index, filter, &mut matched)
    }

    fn get_part_rec(
        &mut self,
        id: PartId,
        index: usize,
        filter: Option<&PartFilter>,
        matched: &mut usize,
    ) -> Result<Option<PartId>> {
        if filter.map_or(true, |f| f.matches(&self.part(id))) {
            if *matched == index {
                return Ok(Some(id));
            }
            *matched += 1;
        }
        let mut i = 0;
        loop {
            let child = if i < self.arena[id].children.len() {
                Some(self.arena[id].children[i])
            } else {
                self.next_child(id)?
            };
            let Some(child) = child else {
                return Ok(None);
            };
            if let Some(found) = self.get_part_rec(child, index, filter, matched)? {
                return Ok(Some(found));
            }
            i += 1;
        }
    }

    /// Every part in depth-first pre-order under (and including) `id`
    /// matching `filter`, fully expanding the subtree first
    pub fn get_all_parts(&mut self, id: PartId, filter: Option<&PartFilter>) -> Result<Vec<PartId>> {
        parser::expand_all(&mut self.arena, &mut self.source, id)?;
        let mut ids = Vec::new();
        self.collect_ids(id, &mut ids);
        Ok(match filter {
            Some(f) => ids.into_iter().filter(|&pid| f.matches(&self.part(pid))).collect(),
            None => ids,
        })
    }

    /// A depth-first pre-order iterator over the parts under (and
    /// including) `id` matching `filter`
    ///
    /// Computed eagerly, like [`Message::get_all_parts`]: nothing here
    /// needs the tree to change shape once the iterator starts.
    pub fn get_iterator(
        &mut self,
        id: PartId,
        filter: Option<&PartFilter>,
    ) -> Result<std::vec::IntoIter<PartId>> {
        Ok(self.get_all_parts(id, filter)?.into_iter())
    }

    /// The `index`-th direct child of `id` matching `filter`, discovering
    /// children lazily as needed, without recursing into grandchildren
    pub fn get_child(
        &mut self,
        id: PartId,
        index: usize,
        filter: Option<&PartFilter>,
    ) -> Result<Option<PartId>> {
        let mut matched = 0;
        let mut i = 0;
        loop {
            let child = if i < self.arena[id].children.len() {
                Some(self.arena[id].children[i])
            } else {
                self.next_child(id)?
            };
            let Some(child) = child else {
                return Ok(None);
            };
            if filter.map_or(true, |f| f.matches(&self.part(child))) {
                if matched == index {
                    return Ok(Some(child));
                }
                matched += 1;
            }
            i += 1;
        }
    }

    /// Every direct child of `id` matching `filter`, fully discovering
    /// `id`'s own children first (but not recursing past them)
    pub fn get_child_parts(&mut self, id: PartId, filter: Option<&PartFilter>) -> Result<Vec<PartId>> {
        self.resolve(id)?;
        let children = self.arena[id].children.clone();
        Ok(match filter {
            Some(f) => children.into_iter().filter(|&pid| f.matches(&self.part(pid))).collect(),
            None => children,
        })
    }

    /// The raw (still transfer-encoded) content bytes of `id`, resolving
    /// it first if necessary
    pub fn content(&mut self, id: PartId) -> Result<Vec<u8>> {
        self.resolve(id)?;
        if let Some(content) = &self.arena[id].content_override {
            return Ok(content.clone());
        }
        if matches!(self.arena[id].kind, PartKind::UuEncoded) {
            let range = self.arena[id].content_range();
            let raw = self.source.read_range(range).to_vec();
            return Ok(uuencode::decode(&raw));
        }
        let range = self.arena[id].content_range();
        Ok(self.source.read_range(range).to_vec())
    }

    /// The content of `id` with Content-Transfer-Encoding decoded
    pub fn decoded_content(&mut self, id: PartId) -> Result<Vec<u8>> {
        if matches!(self.arena[id].kind, PartKind::UuEncoded) {
            return self.content(id);
        }
        let encoding = self.part(id).transfer_encoding();
        let raw = self.content(id)?;
        let (decoded, ugly) = streams::decode_transfer(&raw, encoding);
        if ugly {
            tracing::debug!("part had malformed transfer-encoded data");
        }
        Ok(decoded)
    }

    /// The content of `id` decoded and, for inline `text/plain` parts,
    /// converted from its declared charset to UTF-8
    ///
    /// Attachments and non-plain-text parts are decoded but not
    /// charset-converted, mirroring the teacher's guard against
    /// malware shipped as `text/plain` with a bogus charset.
    pub fn text(&mut self, id: PartId) -> Result<String> {
        let decoded = self.decoded_content(id)?;
        let part = self.part(id);
        if part.is_inline() && part.is_text_plain() {
            let charset = part.charset().unwrap_or("us-ascii").to_string();
            let (s, _) = streams::decode_charset(&decoded, &charset);
            Ok(s)
        } else {
            Ok(String::from_utf8_lossy(&decoded).into_owned())
        }
    }

    /// Like [`Message::text`], but fails with [`Error::DecodingFailure`]
    /// instead of silently substituting U+FFFD when the declared charset
    /// doesn't cleanly cover the decoded bytes
    pub fn text_strict(&mut self, id: PartId) -> Result<String> {
        let decoded = self.decoded_content(id)?;
        let part = self.part(id);
        if part.is_inline() && part.is_text_plain() {
            let charset = part.charset().unwrap_or("us-ascii").to_string();
            streams::decode_charset_strict(&decoded, &charset)
        } else {
            String::from_utf8(decoded)
                .map_err(|e| Error::DecodingFailure(format!("invalid utf-8: {e}")))
        }
    }

    /// Replaces `id`'s own header value, adding the header if absent
    pub fn set_header(&mut self, id: PartId, name: &str, value: &str) {
        let node = &mut self.arena[id];
        node.headers.remove(name);
        node.headers.set(name, value);
        node.headers_dirty = true;
    }

    /// Removes every header named `name` from `id`
    pub fn remove_header(&mut self, id: PartId, name: &str) {
        let node = &mut self.arena[id];
        node.headers.remove(name);
        node.headers_dirty = true;
    }

    /// Overrides `id`'s content with `bytes`, detaching it from its
    /// original children (if it had any): the override becomes the whole
    /// of this part's body on re-emission
    pub fn set_content(&mut self, id: PartId, bytes: Vec<u8>) {
        let node = &mut self.arena[id];
        node.content_override = Some(bytes);
        node.children.clear();
        node.structure_dirty = true;
    }

    /// Moves `id` to become the last child of `new_parent`
    ///
    /// Fails with [`Error::InvalidMutation`] if that would create a
    /// cycle (`new_parent` is `id` itself or one of its descendants).
    pub fn reparent(&mut self, id: PartId, new_parent: PartId) -> Result<()> {
        if id == new_parent || self.is_ancestor(id, new_parent) {
            return Err(Error::InvalidMutation(
                "cannot move a part under itself or one of its own descendants".to_string(),
            ));
        }
        if let Some(old_parent) = self.arena[id].parent {
            self.arena[old_parent].children.retain(|&c| c != id);
            self.arena[old_parent].structure_dirty = true;
        }
        self.arena[new_parent].children.push(id);
        self.arena[new_parent].structure_dirty = true;
        self.arena[id].parent = Some(new_parent);
        Ok(())
    }

    fn is_ancestor(&self, maybe_ancestor: PartId, id: PartId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == maybe_ancestor {
                return true;
            }
            cur = self.arena[c].parent;
        }
        false
    }

    /// Removes `id` (and its whole subtree) from the tree
    ///
    /// Returns whether `id` was actually found under its recorded parent
    /// (`false` if it had already been removed). Fails with
    /// [`Error::InvalidMutation`] for the root part, which cannot be
    /// removed from itself.
    pub fn remove(&mut self, id: PartId) -> Result<bool> {
        if id == self.root {
            return Err(Error::InvalidMutation(
                "the root part cannot be removed".to_string(),
            ));
        }
        let Some(parent) = self.arena[id].parent else {
            return Ok(false);
        };
        let before = self.arena[parent].children.len();
        self.arena[parent].children.retain(|&c| c != id);
        let removed = self.arena[parent].children.len() < before;
        if removed {
            self.arena[parent].structure_dirty = true;
            self.arena[id].parent = None;
        }
        Ok(removed)
    }

    /// Appends a new leaf part with `content` as the last child of
    /// `parent`, or at `position` among its already-discovered children
    /// if given
    ///
    /// The new part starts out with no headers and [`PartKind::Mime`];
    /// call [`Message::set_header`] afterwards to give it a
    /// `Content-Type` and any other header it needs. Fails with
    /// [`Error::InvalidMutation`] unless `parent` is already a multipart
    /// container — there's no boundary line to place a new sibling
    /// under otherwise.
    pub fn add_child(&mut self, parent: PartId, content: Vec<u8>, position: Option<usize>) -> Result<PartId> {
        if !self.part(parent).is_multipart() {
            return Err(Error::InvalidMutation(
                "only a multipart part can receive a new child".to_string(),
            ));
        }
        // Drain any still-lazy siblings first: once `all_parts_parsed` is set,
        // `read_next_mime_child` short-circuits before ever looking at
        // `children.last()`, so the synthetic offsets below are never used to
        // seek the source.
        self.resolve(parent)?;
        let at = self.arena[parent].content_start;
        let node = arena::PartNode {
            kind: PartKind::Mime,
            parent: Some(parent),
            children: Vec::new(),
            headers: HeaderContainer::new(),
            uu_mode: None,
            uu_filename: None,
            header_start: at,
            content_start: at,
            content_end: Some(at),
            strategy: ChildStrategy::None,
            all_parts_parsed: true,
            preamble: Vec::new(),
            epilogue: Vec::new(),
            malformed_header: false,
            malformed_boundary: false,
            truncated: false,
            content_override: Some(content),
            headers_dirty: true,
            structure_dirty: true,
            delivered: 0,
        };
        let child = self.arena.push(node);
        let children = &mut self.arena[parent].children;
        match position {
            Some(pos) if pos < children.len() => children.insert(pos, child),
            _ => children.push(child),
        }
        self.arena[parent].structure_dirty = true;
        Ok(child)
    }

    /// Re-serializes the whole message, expanding any still-lazy part
    /// first so the output reflects the complete tree
    pub fn write(&mut self) -> Result<Vec<u8>> {
        self.expand_all()?;
        Ok(writer::write(&self.arena, &self.source, self.root))
    }

    /// The first part matching `text/plain`, searched depth-first
    pub fn first_text_part(&mut self) -> Result<Option<PartId>> {
        let filter = PartFilter::new().with_content_type_prefix("text/plain");
        Ok(self.find_all(&filter)?.into_iter().next())
    }

    /// The first part matching `text/html`, searched depth-first
    pub fn html_part(&mut self) -> Result<Option<PartId>> {
        let filter = PartFilter::new().with_content_type_prefix("text/html");
        Ok(self.find_all(&filter)?.into_iter().next())
    }

    /// Every part that looks like a user-visible attachment (explicit
    /// `Content-Disposition: attachment`, or an inline part carrying a
    /// filename that isn't the message's main text)
    pub fn attachment_parts(&mut self) -> Result<Vec<PartId>> {
        let filter = PartFilter::new().leaves_only().attachment_only();
        self.find_all(&filter)
    }

    /// Heuristic check for a PGP/SMIME signature leaf part
    pub fn is_signature_part(&self, id: PartId) -> bool {
        self.part(id).is_signature_part()
    }
}

/// Parses a whole mail message into a lazily-expandable part tree
///
/// Only the root's own header block is read eagerly; children are
/// discovered on demand via [`Message::next_child`] or forced all at
/// once via [`Message::expand_all`].
pub fn parse(input: impl Into<Box<[u8]>>) -> Message {
    let mut source = ByteSource::new(input);
    let start = source.tell();
    let looks_mime = {
        let headers = header::read_header_block(&mut source);
        let looks_mime = headers
            .iter()
            .any(|h| h.valid && (h.name == "content-type" || h.name == "mime-version"));
        source.seek(start);
        looks_mime
    };
    let mut arena = Arena::new();
    let root_node = if looks_mime {
        builder::build_node(&mut source, false)
    } else {
        builder::build_nonmime_root(&mut source)
    };
    let root = arena.push(root_node);
    Message {
        source,
        arena,
        root,
    }
}

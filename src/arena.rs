//! Arena-backed storage for the part tree
//!
//! The original component model describes parts that hold a reference to
//! their parent and their children, which in Rust becomes a classic
//! cyclic-reference problem. Rather than reach for `Rc<RefCell<_>>`
//! everywhere, the tree is stored flat in a `Vec<PartNode>` owned by
//! [`crate::Message`], and parts refer to each other by index
//! (`PartId`). This keeps the teacher's plain, `Vec`-backed storage style
//! (see its `Mail::stack: Vec<Part>`) while supporting the arbitrary
//! parent/child/sibling links the tree needs.
use crate::header::HeaderContainer;
use std::ops::Range;

/// An index into a [`crate::Message`]'s part arena
///
/// Stable for the lifetime of the `Message` it was obtained from: removing
/// a part does not reuse or shift other parts' ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub(crate) usize);

/// How a node's children (if any) are discovered
#[derive(Debug, Clone)]
pub(crate) enum ChildStrategy {
    /// Leaf: `Mime` non-multipart, `UuEncoded`
    None,
    /// `Mime` multipart: children are separated by a boundary line
    MimeBoundary(Vec<u8>),
    /// `Message`: exactly one child, spanning the whole content region
    MessageRfc822,
    /// Root `NonMimePart`: children are uuencoded stanzas found by scanning
    /// the body
    UuEncodeScan,
}

/// The tagged kind of a part, matching the spec's `MimePart` /
/// `NonMimePart` / `UUEncodedPart` / `Message` variants as a sum type
/// instead of a class hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// A standards-conforming MIME part (has a `Content-Type`, or is a
    /// direct child of a multipart parent)
    Mime,
    /// A non-MIME message or part: no recognizable MIME structure, may
    /// still contain uuencoded children
    NonMime,
    /// A uuencoded attachment discovered by scanning a `NonMime` body
    UuEncoded,
    /// A `message/rfc822` (or equivalent) part: its single child is a
    /// fully parsed, nested message
    Message,
}

/// A node in the part tree
///
/// Carries both the structural/lazy-parsing state and the data a caller
/// cares about (headers, content range, flaws).
#[derive(Debug)]
pub(crate) struct PartNode {
    pub kind: PartKind,
    pub parent: Option<PartId>,
    pub children: Vec<PartId>,

    pub headers: HeaderContainer,
    /// Synthesized headers for `UuEncoded` parts (`begin MODE FILENAME`)
    pub uu_mode: Option<u32>,
    pub uu_filename: Option<String>,

    /// Byte offset where this node's header block starts
    pub header_start: usize,
    /// Byte offset right after the header block's terminating blank line
    pub content_start: usize,
    /// Byte offset of the end of this node's content, once resolved
    pub content_end: Option<usize>,

    pub strategy: ChildStrategy,
    /// True once every child (and, transitively, every descendant) has
    /// been discovered
    pub all_parts_parsed: bool,

    /// Raw bytes preceding the first child boundary (multipart preamble)
    pub preamble: Vec<u8>,
    /// Raw bytes following the closing boundary (multipart epilogue)
    pub epilogue: Vec<u8>,

    pub malformed_header: bool,
    pub malformed_boundary: bool,
    pub truncated: bool,

    /// Content overridden via a mutation; when set, takes precedence over
    /// the original byte range for both reading and re-emission
    pub content_override: Option<Vec<u8>>,

    /// Set once this node's own headers have been added to, changed or
    /// removed, forcing the writer to re-serialize them instead of
    /// copying the original bytes verbatim
    pub headers_dirty: bool,
    /// Set once this node's direct children list has been mutated
    /// (reparenting, insertion, removal), forcing the writer to
    /// re-serialize this node's boundaries instead of copying them
    pub structure_dirty: bool,

    /// How many of this node's children have been handed out by
    /// [`crate::parser::read_next_child`] so far
    ///
    /// Only meaningful for [`ChildStrategy::UuEncodeScan`], where the
    /// whole subtree is discovered in one scan but still needs to be
    /// revealed to callers one part at a time
    pub delivered: usize,
}

impl PartNode {
    pub fn content_range(&self) -> Range<usize> {
        self.content_start..self.content_end.unwrap_or(self.content_start)
    }
}

/// The part tree's storage: an arena of nodes plus the root's id
pub(crate) struct Arena {
    nodes: Vec<PartNode>,
}

impl Arena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: PartNode) -> PartId {
        let id = PartId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: PartId) -> &PartNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: PartId) -> &mut PartNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = PartId> {
        (0..self.nodes.len()).map(PartId)
    }
}

impl std::ops::Index<PartId> for Arena {
    type Output = PartNode;
    fn index(&self, id: PartId) -> &PartNode {
        &self.nodes[id.0]
    }
}

impl std::ops::IndexMut<PartId> for Arena {
    fn index_mut(&mut self, id: PartId) -> &mut PartNode {
        &mut self.nodes[id.0]
    }
}

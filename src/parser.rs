//! Lazy, on-demand expansion of the part tree
//!
//! This is the `Parser`/`ParserProxy` pairing from the component model,
//! generalized from the teacher's `Mail::load_next_part`: where the
//! teacher walks a single `Vec<Part>` stack representing the currently
//! open multipart chain, each node here carries its own boundary state
//! (`ChildStrategy`) and the "proxy" is simply "the arena plus the shared
//! byte source", since Rust has no free-standing cyclic object to bind a
//! parser instance to the way the original does.
use crate::arena::{Arena, ChildStrategy, PartId};
use crate::builder;
use crate::error::{Error, Result};
use crate::source::ByteSource;
use crate::uuencode;

fn without_eol(line: &[u8]) -> &[u8] {
    let mut l = line;
    while matches!(l.last(), Some(b'\r') | Some(b'\n')) {
        l = &l[..l.len() - 1];
    }
    l
}

fn is_boundary_start(line: &[u8], boundary: &[u8]) -> bool {
    line.starts_with(b"--") && &line[2..] == boundary
}

fn is_boundary_end(line: &[u8], boundary: &[u8]) -> bool {
    let blen = boundary.len();
    line.len() == blen + 4
        && line.starts_with(b"--")
        && line.ends_with(b"--")
        && &line[2..blen + 2] == boundary
}

/// The boundary that bounds `node`'s own content, inherited from the
/// nearest ancestor that actually declares one (a `Message` node, or the
/// true root, has none of its own and defers to its parent)
fn effective_stop_boundary(arena: &Arena, node: PartId) -> Option<Vec<u8>> {
    let mut cur = arena[node].parent;
    while let Some(id) = cur {
        if let ChildStrategy::MimeBoundary(b) = &arena[id].strategy {
            return Some(b.clone());
        }
        cur = arena[id].parent;
    }
    None
}

/// Ensures `id`'s content (and, transitively, its whole subtree) has been
/// fully discovered, advancing the shared source cursor as needed
///
/// This is the "drain the last child before reading the next sibling"
/// rule from the spec: callers must invoke this on a node before asking
/// its parent for a further sibling, and the tree-mutation API invokes it
/// implicitly before any read that would otherwise see a stale cursor.
pub(crate) fn ensure_resolved(arena: &mut Arena, source: &mut ByteSource, id: PartId) -> Result<()> {
    if arena[id].content_end.is_some() && arena[id].all_parts_parsed {
        return Ok(());
    }
    match arena[id].strategy.clone() {
        ChildStrategy::None => resolve_leaf(arena, source, id),
        ChildStrategy::MimeBoundary(_) => {
            while read_next_child(arena, source, id)?.is_some() {}
            Ok(())
        }
        ChildStrategy::MessageRfc822 => resolve_message(arena, source, id),
        ChildStrategy::UuEncodeScan => resolve_uuencode_root(arena, source, id),
    }
}

fn resolve_leaf(arena: &mut Arena, source: &mut ByteSource, id: PartId) -> Result<()> {
    let stop_boundary = effective_stop_boundary(arena, id);
    source.seek(arena[id].content_start);
    loop {
        let line = source.peek_line();
        if line.is_empty() {
            arena[id].truncated = true;
            arena[id].content_end = Some(source.tell());
            arena[id].all_parts_parsed = true;
            return Ok(());
        }
        if let Some(boundary) = &stop_boundary {
            let trimmed = without_eol(line);
            if is_boundary_start(trimmed, boundary) || is_boundary_end(trimmed, boundary) {
                arena[id].content_end = Some(source.tell());
                arena[id].all_parts_parsed = true;
                return Ok(());
            }
        }
        source.read_line();
    }
}

fn resolve_message(arena: &mut Arena, source: &mut ByteSource, id: PartId) -> Result<()> {
    if arena[id].children.is_empty() {
        source.seek(arena[id].content_start);
        let child_of_digest = false;
        let node = builder::build_node(source, child_of_digest);
        let child = arena.push(node);
        arena[child].parent = Some(id);
        arena[id].children.push(child);
    }
    let child = arena[id].children[0];
    ensure_resolved(arena, source, child)?;
    arena[id].content_end = arena[child].content_end;
    arena[id].all_parts_parsed = true;
    Ok(())
}

fn resolve_uuencode_root(arena: &mut Arena, source: &mut ByteSource, id: PartId) -> Result<()> {
    let start = arena[id].content_start;
    let end = source.len();
    let buf = source.read_range(start..end).to_vec();
    let nodes = uuencode::scan(&buf, start);
    for mut node in nodes {
        node.parent = Some(id);
        let child = arena.push(node);
        arena[id].children.push(child);
    }
    source.seek(end);
    arena[id].content_end = Some(end);
    arena[id].all_parts_parsed = true;
    Ok(())
}

/// Discovers the next not-yet-seen child of `parent`, resolving the
/// previous one's content first if needed
///
/// `Mime` multipart parents reveal one new child per call, scanning
/// forward from the last discovered sibling. `Message` parents have
/// exactly one child, produced on the first call. `NonMime` roots scan
/// their whole remaining body for uuencode stanzas on the first call
/// (the regex scan can't be done incrementally) but still hand them back
/// to the caller one at a time, matching the MIME case's contract.
pub(crate) fn read_next_child(
    arena: &mut Arena,
    source: &mut ByteSource,
    parent: PartId,
) -> Result<Option<PartId>> {
    match arena[parent].strategy.clone() {
        ChildStrategy::None => Ok(None),
        ChildStrategy::MessageRfc822 => read_next_message_child(arena, source, parent),
        ChildStrategy::UuEncodeScan => read_next_uuencode_child(arena, source, parent),
        ChildStrategy::MimeBoundary(boundary) => {
            read_next_mime_child(arena, source, parent, &boundary)
        }
    }
}

fn read_next_message_child(
    arena: &mut Arena,
    source: &mut ByteSource,
    parent: PartId,
) -> Result<Option<PartId>> {
    if !arena[parent].children.is_empty() {
        return Ok(None);
    }
    source.seek(arena[parent].content_start);
    let node = builder::build_node(source, false);
    let child = arena.push(node);
    arena[child].parent = Some(parent);
    arena[parent].children.push(child);
    Ok(Some(child))
}

fn read_next_uuencode_child(
    arena: &mut Arena,
    source: &mut ByteSource,
    parent: PartId,
) -> Result<Option<PartId>> {
    if !arena[parent].all_parts_parsed && arena[parent].children.is_empty() {
        let start = arena[parent].content_start;
        let end = source.len();
        let buf = source.read_range(start..end).to_vec();
        let nodes = uuencode::scan(&buf, start);
        for mut node in nodes {
            node.parent = Some(parent);
            let child = arena.push(node);
            arena[parent].children.push(child);
        }
        source.seek(end);
    }
    let idx = arena[parent].delivered;
    if idx < arena[parent].children.len() {
        arena[parent].delivered += 1;
        return Ok(Some(arena[parent].children[idx]));
    }
    if !arena[parent].all_parts_parsed {
        arena[parent].content_end = Some(source.len());
        arena[parent].all_parts_parsed = true;
    }
    Ok(None)
}

fn read_next_mime_child(
    arena: &mut Arena,
    source: &mut ByteSource,
    parent: PartId,
    boundary: &[u8],
) -> Result<Option<PartId>> {
    if arena[parent].all_parts_parsed {
        return Ok(None);
    }
    if let Some(&last) = arena[parent].children.last() {
        ensure_resolved(arena, source, last)?;
        source.seek(arena[last].content_end.unwrap_or_else(|| source.tell()));
    } else {
        source.seek(arena[parent].content_start);
    }

    loop {
        let line = source.peek_line();
        if line.is_empty() {
            arena[parent].truncated = true;
            arena[parent].all_parts_parsed = true;
            arena[parent].content_end = Some(source.tell());
            return Ok(None);
        }
        let trimmed = without_eol(line).to_vec();
        if is_boundary_start(&trimmed, boundary) {
            source.read_line();
            let child_of_digest = arena[parent]
                .headers
                .get("content-type")
                .map(|h| h.value == "multipart/digest")
                .unwrap_or(false);
            let node = builder::build_node(source, child_of_digest);
            let child = arena.push(node);
            arena[child].parent = Some(parent);
            arena[parent].children.push(child);
            return Ok(Some(child));
        }
        if is_boundary_end(&trimmed, boundary) {
            source.read_line();
            arena[parent].all_parts_parsed = true;
            collect_epilogue(arena, source, parent)?;
            return Ok(None);
        }
        // preamble (no children discovered yet) or, in malformed input, a
        // stray line between siblings: keep it for re-emission fidelity
        let raw = source.read_line().to_vec();
        if arena[parent].children.is_empty() {
            arena[parent].preamble.extend_from_slice(&raw);
        } else {
            arena[parent].epilogue.extend_from_slice(&raw);
        }
    }
}

fn collect_epilogue(arena: &mut Arena, source: &mut ByteSource, parent: PartId) -> Result<()> {
    let stop_boundary = arena[parent]
        .parent
        .and_then(|gp| match &arena[gp].strategy {
            ChildStrategy::MimeBoundary(b) => Some(b.clone()),
            _ => None,
        });
    loop {
        let line = source.peek_line();
        if line.is_empty() {
            arena[parent].content_end = Some(source.tell());
            return Ok(());
        }
        if let Some(boundary) = &stop_boundary {
            let trimmed = without_eol(line);
            if is_boundary_start(trimmed, boundary) || is_boundary_end(trimmed, boundary) {
                arena[parent].content_end = Some(source.tell());
                return Ok(());
            }
        }
        let raw = source.read_line().to_vec();
        arena[parent].epilogue.extend_from_slice(&raw);
    }
}

/// Forces complete discovery of every part reachable from `root`
///
/// Used by [`crate::parse`] when a caller asks for the fully-expanded
/// tree instead of walking it lazily, and by the writer before
/// re-emitting a message.
pub(crate) fn expand_all(arena: &mut Arena, source: &mut ByteSource, root: PartId) -> Result<()> {
    ensure_resolved(arena, source, root)?;
    let mut i = 0;
    while i < arena[root].children.len() {
        let child = arena[root].children[i];
        expand_all(arena, source, child)?;
        i += 1;
    }
    Ok(())
}

/// Returns whether `id`'s own kind can ever have children
pub(crate) fn can_have_children(arena: &Arena, id: PartId) -> bool {
    !matches!(arena[id].strategy, ChildStrategy::None)
}

pub(crate) fn map_error_for_truncation(id: PartId, arena: &Arena) -> Option<Error> {
    if arena[id].truncated {
        Some(Error::TruncatedMessage(format!(
            "part {} ended before its terminating boundary",
            id.0
        )))
    } else {
        None
    }
}

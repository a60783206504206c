//! Declarative part selection
//!
//! The teacher's decoder is configured imperatively, one `Part` at a time,
//! by code embedded in the worker's request loop. The spec calls for a
//! reusable, composable selector instead, so `PartFilter` is a plain value
//! object (no captured closures) whose predicates are combined by
//! conjunction - closer to how `Header::get_param` or `Part::is_text`
//! are simple, inspectable methods than to a callback pipeline.
use crate::arena::PartKind;
use crate::PartRef;

/// A composable predicate over parts
///
/// An empty filter (`PartFilter::new()`) matches everything. Each `with_*`
/// builder narrows the match; all conditions set on a filter must hold for
/// a part to match (logical AND).
#[derive(Debug, Clone, Default)]
pub struct PartFilter {
    kind: Option<PartKind>,
    content_type_prefix: Option<String>,
    exclude_content_type_prefix: Option<String>,
    inline_only: bool,
    attachment_only: bool,
    include_multipart_containers: bool,
}

impl PartFilter {
    /// A filter that matches every part
    pub fn new() -> Self {
        Self {
            include_multipart_containers: true,
            ..Self::default()
        }
    }

    /// Restricts to a single [`PartKind`]
    pub fn with_kind(mut self, kind: PartKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts to parts whose content type starts with `prefix`
    /// (e.g. `"text/"`, `"image/png"`)
    pub fn with_content_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.content_type_prefix = Some(prefix.into().to_lowercase());
        self
    }

    /// Excludes parts whose content type starts with `prefix`
    pub fn without_content_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_content_type_prefix = Some(prefix.into().to_lowercase());
        self
    }

    /// Restricts to parts with an inline (non-attachment) disposition
    pub fn inline_only(mut self) -> Self {
        self.inline_only = true;
        self
    }

    /// Restricts to parts with an attachment disposition
    pub fn attachment_only(mut self) -> Self {
        self.attachment_only = true;
        self
    }

    /// Excludes multipart container parts from the match (leaf parts only)
    pub fn leaves_only(mut self) -> Self {
        self.include_multipart_containers = false;
        self
    }

    /// Evaluates the filter against a part
    pub fn matches(&self, part: &PartRef<'_>) -> bool {
        if let Some(kind) = &self.kind {
            if part.kind() != kind {
                return false;
            }
        }
        if !self.include_multipart_containers && part.is_multipart() {
            return false;
        }
        if let Some(prefix) = &self.content_type_prefix {
            if !part
                .content_type()
                .is_some_and(|ct| ct.to_lowercase().starts_with(prefix.as_str()))
            {
                return false;
            }
        }
        if let Some(prefix) = &self.exclude_content_type_prefix {
            if part
                .content_type()
                .is_some_and(|ct| ct.to_lowercase().starts_with(prefix.as_str()))
            {
                return false;
            }
        }
        if self.inline_only && !part.is_inline() {
            return false;
        }
        if self.attachment_only && part.is_inline() {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_filter_matches_all() {
        let f = PartFilter::new();
        assert!(f.content_type_prefix.is_none());
        assert!(f.kind.is_none());
    }

    #[test]
    fn test_builder_is_conjunctive() {
        let f = PartFilter::new()
            .with_content_type_prefix("text/")
            .attachment_only();
        assert_eq!(f.content_type_prefix.as_deref(), Some("text/"));
        assert!(f.attachment_only);
        assert!(!f.inline_only);
    }
}

//! Loader configuration.

/// How strictly descriptions are checked and whether nodes are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Reject links to indices outside the description (`E102`) instead of
    /// dropping them.
    pub strict_links: bool,
    /// Reject unknown type tags (`E101`) instead of skipping the node.
    pub strict_kinds: bool,
    /// Merge structurally identical nodes.
    pub dedup: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strict_links: true,
            strict_kinds: true,
            dedup: true,
        }
    }
}

impl LoaderConfig {
    /// Drop out-of-range links and skip unknown tags.
    pub fn lenient() -> Self {
        Self {
            strict_links: false,
            strict_kinds: false,
            dedup: true,
        }
    }

    /// Set link strictness.
    pub fn with_strict_links(mut self, strict: bool) -> Self {
        self.strict_links = strict;
        self
    }

    /// Set tag strictness.
    pub fn with_strict_kinds(mut self, strict: bool) -> Self {
        self.strict_kinds = strict;
        self
    }

    /// Enable or disable node merging.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}

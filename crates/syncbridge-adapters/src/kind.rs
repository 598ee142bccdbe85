//! The closed adapter-variant set (SPEC_FULL §4.3).

use std::fmt;

/// Which external dependency an [`crate::EntityAdapter`] talks to. Closed,
/// mirroring [`syncbridge_core::EntityType`]'s rationale: the four
/// dependencies this service reconciles are fixed by the integration it
/// implements, not something an operator configures at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// The safety-management SaaS: the only writable dependency.
    Target,
    Fleet,
    Directory,
    Erp,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Target => "target",
            AdapterKind::Fleet => "fleet",
            AdapterKind::Directory => "directory",
            AdapterKind::Erp => "erp",
        }
    }

    /// Only the target dependency accepts writes; fleet/directory/erp are
    /// read-only sources of record (SPEC_FULL §1).
    pub fn is_writable(&self) -> bool {
        matches!(self, AdapterKind::Target)
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

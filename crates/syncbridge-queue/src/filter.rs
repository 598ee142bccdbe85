//! Listing filters and paging for the failed-record queue (spec §4.6).

use syncbridge_core::EntityType;

/// `list(filter, paging)` selection criteria. Dismissed records are hidden
/// unless `include_dismissed` is set, matching spec §4.6's "dismissed
/// records are retained but hidden from default listings".
#[derive(Debug, Clone, Default)]
pub struct QueueFilter {
    pub entity_type: Option<EntityType>,
    pub include_dismissed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

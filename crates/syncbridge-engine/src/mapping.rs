//! Which dependency is the read-only source of record for each entity
//! type (spec §1: ERP for the employee/job database, the fleet provider
//! for vehicles, the directory service for organizational structure).
//!
//! Must agree with `syncbridge_adapters::erp::table_for` — the ERP only
//! exposes the tables it actually has.

use syncbridge_adapters::AdapterKind;
use syncbridge_core::{EntityType, SyncType};

/// The adapter a syncer reads from before validating and writing to the
/// target. `role` and `site` are modeled as directory data and
/// `asset_type` as fleet data — spec.md doesn't name an explicit owner
/// for either, so this is a recorded Open Question decision (see
/// DESIGN.md).
pub fn source_for(entity_type: EntityType) -> AdapterKind {
    match entity_type {
        EntityType::Employee | EntityType::Job | EntityType::Department | EntityType::Title => AdapterKind::Erp,
        EntityType::Vehicle | EntityType::AssetType => AdapterKind::Fleet,
        EntityType::Role | EntityType::Site => AdapterKind::Directory,
    }
}

/// The entity types a `sync_type` trigger covers, in `SYNC_ORDER`. `full`
/// is the only trigger that reaches `role`, `site`, and `asset_type` —
/// spec §4.7 names no dedicated partial sync for those three, so they
/// only ever sync as part of a full session (Open Question, see
/// DESIGN.md).
pub fn entities_for(sync_type: SyncType) -> Vec<EntityType> {
    let wanted: &[EntityType] = match sync_type {
        SyncType::Employees => &[EntityType::Employee],
        SyncType::Vehicles => &[EntityType::Vehicle],
        SyncType::Departments => &[EntityType::Department],
        SyncType::Jobs => &[EntityType::Job],
        SyncType::Titles => &[EntityType::Title],
        SyncType::Full => return EntityType::SYNC_ORDER.to_vec(),
    };
    EntityType::SYNC_ORDER.iter().copied().filter(|e| wanted.contains(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sync_order_entity_has_a_source() {
        for entity_type in EntityType::SYNC_ORDER {
            let _ = source_for(entity_type);
        }
    }

    #[test]
    fn employees_and_jobs_come_from_the_erp() {
        assert_eq!(source_for(EntityType::Employee), AdapterKind::Erp);
        assert_eq!(source_for(EntityType::Job), AdapterKind::Erp);
    }

    #[test]
    fn a_partial_sync_type_covers_exactly_its_one_entity() {
        assert_eq!(entities_for(SyncType::Employees), vec![EntityType::Employee]);
        assert_eq!(entities_for(SyncType::Vehicles), vec![EntityType::Vehicle]);
    }

    #[test]
    fn full_covers_every_entity_in_sync_order() {
        assert_eq!(entities_for(SyncType::Full), EntityType::SYNC_ORDER.to_vec());
    }
}

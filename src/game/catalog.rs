//! Static Map and Weapon Catalogs
//!
//! Read-only `id -> name` lookup tables. The engine never fails on an
//! unknown id: unknown maps fall back to the default map, and weapon ids
//! are drawn uniformly from the full catalog key set.

use crate::core::rng::SimRng;

/// A single catalog row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Numeric identifier used on the wire.
    pub id: u32,
    /// Display name.
    pub name: &'static str,
}

/// Playable maps.
pub const MAPS: &[CatalogEntry] = &[
    CatalogEntry { id: 1, name: "Dust2" },
    CatalogEntry { id: 2, name: "Mirage" },
    CatalogEntry { id: 3, name: "Inferno" },
    CatalogEntry { id: 4, name: "Nuke" },
    CatalogEntry { id: 5, name: "Overpass" },
    CatalogEntry { id: 6, name: "Vertigo" },
    CatalogEntry { id: 7, name: "Ancient" },
    CatalogEntry { id: 8, name: "Anubis" },
    CatalogEntry { id: 9, name: "Train" },
];

/// Weapons a player can spawn with.
pub const WEAPONS: &[CatalogEntry] = &[
    CatalogEntry { id: 1, name: "AK-47" },
    CatalogEntry { id: 2, name: "M4A4" },
    CatalogEntry { id: 3, name: "AWP" },
    CatalogEntry { id: 4, name: "USP-S" },
    CatalogEntry { id: 5, name: "Glock-18" },
    CatalogEntry { id: 6, name: "Desert Eagle" },
    CatalogEntry { id: 7, name: "P250" },
    CatalogEntry { id: 8, name: "FAMAS" },
    CatalogEntry { id: 9, name: "Galil AR" },
    CatalogEntry { id: 10, name: "SG 553" },
    CatalogEntry { id: 11, name: "SSG-08" },
];

/// Look up a map by id.
pub fn map(id: u32) -> Option<&'static CatalogEntry> {
    MAPS.iter().find(|m| m.id == id)
}

/// The map used when a requested map id is unknown.
pub fn default_map() -> &'static CatalogEntry {
    &MAPS[0]
}

/// Resolve a map id, falling back to the default map.
///
/// The fallback is a policy choice carried over from match creation:
/// an unknown id yields a playable match, not an error.
pub fn resolve_map(id: u32) -> &'static CatalogEntry {
    map(id).unwrap_or_else(default_map)
}

/// Look up a weapon by id.
pub fn weapon(id: u32) -> Option<&'static CatalogEntry> {
    WEAPONS.iter().find(|w| w.id == id)
}

/// Draw a uniformly random weapon id from the full catalog.
pub fn random_weapon_id(rng: &mut SimRng) -> u32 {
    WEAPONS[rng.next_index(WEAPONS.len())].id
}

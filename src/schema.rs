/// Column-name constants for the spawn-index tables.
/// Single source of truth - shared by the frame readers and the Python module.

// ── Area hierarchy columns ──────────────────────────────────────────────────
pub mod area {
    pub const SAR: &str = "sar";
    pub const REGION: &str = "region";
    pub const REGION_NAME: &str = "region_name";
    pub const STAT_AREA: &str = "stat_area";
    pub const GROUP: &str = "group";
    pub const SECTION: &str = "section";
    pub const LOCATION_CODE: &str = "location_code";
    pub const LOCATION_NAME: &str = "location_name";
    pub const POOL: &str = "pool";
    pub const EASTING: &str = "easting";
    pub const NORTHING: &str = "northing";

    pub const REQUIRED: [&str; 7] = [
        SAR,
        REGION,
        REGION_NAME,
        STAT_AREA,
        SECTION,
        LOCATION_CODE,
        LOCATION_NAME,
    ];
}

// ── Median width columns ────────────────────────────────────────────────────
pub mod width {
    pub const REGION: &str = "region";
    pub const SECTION: &str = "section";
    pub const POOL: &str = "pool";
    pub const WIDTH_REGION: &str = "width_region";
    pub const WIDTH_SECTION: &str = "width_section";
    pub const WIDTH_POOL: &str = "width_pool";
}

// ── Intensity category columns ──────────────────────────────────────────────
pub mod intensity {
    pub const CATEGORY: &str = "intensity";
    pub const DESCRIPTION: &str = "description";
    pub const LAYERS: &str = "layers";
}

// ── Spawn event columns (one row per spawn) ─────────────────────────────────
pub mod spawn {
    pub const YEAR: &str = "year";
    pub const LOCATION_CODE: &str = "location_code";
    pub const SPAWN_NUMBER: &str = "spawn_number";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
    pub const LENGTH: &str = "length";
    pub const WIDTH_OBS: &str = "width_obs";

    pub const KEY: [&str; 3] = [YEAR, LOCATION_CODE, SPAWN_NUMBER];
}

// ── Surface quadrat columns ─────────────────────────────────────────────────
pub mod surface {
    pub const INTENSITY: &str = "intensity";
    pub const EGG_LAYERS: &str = "egg_layers";
}

// ── Macrocystis columns ─────────────────────────────────────────────────────
pub mod macrocystis {
    pub const TRANSECT: &str = "transect";
    pub const AREA: &str = "area";
    pub const SPAWN_FRACTION: &str = "spawn_fraction";
    pub const HEIGHT: &str = "height";
    pub const STALKS: &str = "stalks";
    pub const LAYERS: &str = "layers";
}

// ── Understory columns ──────────────────────────────────────────────────────
pub mod understory {
    pub const TRANSECT: &str = "transect";
    pub const WIDTH: &str = "width";
    pub const QUADRAT: &str = "quadrat";
    pub const SUBSTRATE_LAYERS: &str = "substrate_layers";
    pub const SUBSTRATE_PROPORTION: &str = "substrate_proportion";
    pub const ALGAE_TYPE: &str = "algae_type";
    pub const ALGAE_LAYERS: &str = "algae_layers";
    pub const ALGAE_PROPORTION: &str = "algae_proportion";
}

// ── Spawn-on-kelp harvest columns ───────────────────────────────────────────
// Keyed like spawn events.
pub mod sok {
    pub const PRODUCT_KG: &str = "product_kg";
}

// ── Spawn index result columns ──────────────────────────────────────────────
pub mod result {
    pub const METHOD: &str = "method";
    pub const YEAR: &str = "year";
    pub const REGION: &str = "region";
    pub const STAT_AREA: &str = "stat_area";
    pub const SECTION: &str = "section";
    pub const LOCATION_CODE: &str = "location_code";
    pub const SPAWN_NUMBER: &str = "spawn_number";
    pub const LENGTH: &str = "length";
    pub const WIDTH: &str = "width";
    pub const WIDTH_SOURCE: &str = "width_source";
    pub const WIDTH_OBS: &str = "width_obs";
    pub const EGG_DENSITY: &str = "egg_density";
    pub const EGGS: &str = "eggs";
    pub const SPAWN_INDEX: &str = "spawn_index";
}

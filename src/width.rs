//! Median spawn widths by pool, section and region.
//!
//! Surface spawn widths observed in the field are biased low, so the surface
//! index uses the most specific median width available instead.

use std::collections::HashMap;
use std::fmt;

use crate::area::Location;
use crate::error::{Result, SpawnIndexError};

/// Granularity a width was resolved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WidthSource {
    Pool,
    Section,
    Region,
}

impl WidthSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Section => "section",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for WidthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedWidth {
    pub width_m: f64,
    pub source: WidthSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionWidth {
    pub region: String,
    pub width_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionWidth {
    pub region: String,
    pub section: i64,
    pub width_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolWidth {
    pub region: String,
    pub section: i64,
    pub pool: String,
    pub width_m: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WidthTables {
    region: HashMap<String, f64>,
    section: HashMap<(String, i64), f64>,
    pool: HashMap<(String, i64, String), f64>,
}

fn check_width(what: String, width: f64) -> Result<f64> {
    if !width.is_finite() || width < 0.0 {
        return Err(SpawnIndexError::InvalidMeasurement(format!(
            "median width for {what} must be non-negative, got {width}"
        )));
    }
    Ok(width)
}

impl WidthTables {
    pub fn new(
        regions: Vec<RegionWidth>,
        sections: Vec<SectionWidth>,
        pools: Vec<PoolWidth>,
    ) -> Result<Self> {
        let mut tables = Self::default();
        for r in regions {
            let w = check_width(format!("region {}", r.region), r.width_m)?;
            tables.region.insert(r.region, w);
        }
        for s in sections {
            let w = check_width(format!("section {}", s.section), s.width_m)?;
            tables.section.insert((s.region, s.section), w);
        }
        for p in pools {
            let w = check_width(format!("pool {} in section {}", p.pool, p.section), p.width_m)?;
            tables.pool.insert((p.region, p.section, p.pool), w);
        }
        Ok(tables)
    }

    /// Width for `location`, most specific first: pool, section, region.
    pub fn resolve(&self, location: &Location) -> Result<ResolvedWidth> {
        let region = location.region.clone();
        let section = location.section;
        let pool = location.pool.as_ref().and_then(|pool| {
            self.pool
                .get(&(region.clone(), section, pool.clone()))
                .copied()
        });

        let candidates = [
            (WidthSource::Pool, pool),
            (WidthSource::Section, self.section.get(&(region.clone(), section)).copied()),
            (WidthSource::Region, self.region.get(&region).copied()),
        ];

        candidates
            .into_iter()
            .find_map(|(source, width)| width.map(|width_m| ResolvedWidth { width_m, source }))
            .ok_or(SpawnIndexError::NoWidthAvailable(location.location_code))
    }
}

use std::collections::BTreeMap;

use crate::error::{Result, SpawnIndexError};

/// One spawn location and its place in the spatial hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub sar: i64,
    pub region: String,
    pub region_name: String,
    pub stat_area: i64,
    pub group: Option<String>,
    pub section: i64,
    pub location_code: i64,
    pub location_name: String,
    pub pool: Option<String>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
}

/// Locations keyed by location code.
#[derive(Debug, Clone, Default)]
pub struct AreaHierarchy {
    locations: BTreeMap<i64, Location>,
}

impl AreaHierarchy {
    /// Build the lookup. A location code listed twice must agree on its
    /// region, statistical area and section.
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        let mut map: BTreeMap<i64, Location> = BTreeMap::new();
        for loc in locations {
            if let Some(existing) = map.get(&loc.location_code) {
                if existing.region != loc.region
                    || existing.stat_area != loc.stat_area
                    || existing.section != loc.section
                {
                    return Err(SpawnIndexError::InvalidData(format!(
                        "Location {} maps to more than one section",
                        loc.location_code
                    )));
                }
                continue;
            }
            map.insert(loc.location_code, loc);
        }
        Ok(Self { locations: map })
    }

    pub fn get(&self, location_code: i64) -> Result<&Location> {
        self.locations
            .get(&location_code)
            .ok_or(SpawnIndexError::UnknownLocation(location_code))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(code: i64, section: i64) -> Location {
        Location {
            sar: 4,
            region: "SoG".to_string(),
            region_name: "Strait of Georgia".to_string(),
            stat_area: 14,
            group: None,
            section,
            location_code: code,
            location_name: format!("Loc {code}"),
            pool: None,
            easting: None,
            northing: None,
        }
    }

    #[test]
    fn lookup_by_code() {
        let areas = AreaHierarchy::new(vec![location(1, 142), location(2, 143)]).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas.get(2).unwrap().section, 143);
        assert!(matches!(
            areas.get(9),
            Err(SpawnIndexError::UnknownLocation(9))
        ));
    }

    #[test]
    fn conflicting_sections_rejected() {
        assert!(AreaHierarchy::new(vec![location(1, 142), location(1, 143)]).is_err());
    }
}

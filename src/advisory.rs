//! Soft diagnostics collected alongside calculation results.

use std::fmt;

use tracing::warn;

use crate::index::SpawnKey;

/// A non-fatal condition worth reporting to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    YearOutsideAssessment {
        year: i32,
        assessment_start: i32,
        assessment_end: i32,
    },
    ThetaFarFromDefault {
        theta: f64,
    },
    IncompleteMetadata {
        location_code: i64,
        section: i64,
    },
    ExcludedEvent {
        key: SpawnKey,
        reason: String,
    },
    NonDefaultParameter {
        group: &'static str,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YearOutsideAssessment {
                year,
                assessment_start,
                assessment_end,
            } => write!(
                f,
                "year {year} is outside the assessment window {assessment_start}-{assessment_end}"
            ),
            Self::ThetaFarFromDefault { theta } => {
                write!(f, "egg conversion factor {theta:e} is far from 1e8 eggs/t")
            }
            Self::IncompleteMetadata {
                location_code,
                section,
            } => write!(
                f,
                "location {location_code}: section {section} has no group"
            ),
            Self::ExcludedEvent { key, reason } => write!(
                f,
                "excluded spawn {} at location {} in {}: {reason}",
                key.spawn_number, key.location_code, key.year
            ),
            Self::NonDefaultParameter { group } => {
                write!(f, "non-default {group} parameters in use")
            }
        }
    }
}

/// Collects advisories for one calculation call; quiet mode drops them.
#[derive(Debug, Default)]
pub struct Advisories {
    quiet: bool,
    items: Vec<Advisory>,
}

impl Advisories {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, advisory: Advisory) {
        if self.quiet {
            return;
        }
        warn!("{advisory}");
        self.items.push(advisory);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Advisory> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Advisory> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_mode_drops_advisories() {
        let mut advisories = Advisories::new(true);
        advisories.push(Advisory::ThetaFarFromDefault { theta: 1.0 });
        assert!(advisories.is_empty());
    }

    #[test]
    fn collects_in_order() {
        let mut advisories = Advisories::new(false);
        advisories.push(Advisory::NonDefaultParameter { group: "surface" });
        advisories.push(Advisory::ThetaFarFromDefault { theta: 5e9 });
        let items = advisories.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].to_string(), "non-default surface parameters in use");
    }
}

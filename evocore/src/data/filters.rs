use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Number of photometric filter slots in the scatter-file header.
pub const FILTS: usize = 8;

/// Filter names, in slot order.
pub const FILTER_NAMES: [&str; FILTS] = ["U", "B", "V", "R", "I", "J", "H", "K"];

/// Absorption relative to A_V per filter slot (CCM-style extinction ratios).
pub const ABSORPTION_RATIO: [f64; FILTS] =
    [1.531, 1.324, 1.000, 0.748, 0.482, 0.282, 0.175, 0.112];

/// Photometric systems a model family may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSetName {
    UBVRIJHK,
    ACS,
    SDSS,
}

impl Display for FilterSetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilterSetName::UBVRIJHK => write!(f, "UBVRIJHK"),
            FilterSetName::ACS => write!(f, "ACS"),
            FilterSetName::SDSS => write!(f, "SDSS"),
        }
    }
}

/// The ordered set of active filter slots for a run.
///
/// Built once from the scatter-file header bitmask and immutable afterwards;
/// every component that synthesizes or reports photometry reads from the same
/// set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterSet {
    active: Vec<usize>,
}

impl FilterSet {
    /// Builds the active set from the per-slot header flags.
    pub fn from_flags(flags: &[bool]) -> Self {
        let active = flags
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(slot, _)| slot)
            .collect();
        FilterSet { active }
    }

    /// Number of active filters.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Slot index of the i-th active filter.
    pub fn slot(&self, i: usize) -> usize {
        self.active[i]
    }

    /// Iterates over active slot indices in order.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.iter().copied()
    }

    /// Name of the i-th active filter.
    pub fn name(&self, i: usize) -> &'static str {
        FILTER_NAMES[self.active[i]]
    }

    /// Absorption ratio of the i-th active filter relative to A_V.
    pub fn absorption_ratio(&self, i: usize) -> f64 {
        ABSORPTION_RATIO[self.active[i]]
    }
}

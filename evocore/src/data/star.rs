use serde::{Deserialize, Serialize};

use crate::data::cluster::{Cluster, EPS};

/// Model-derived evolutionary stage of a stellar component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarStatus {
    /// Main sequence or red giant branch.
    Msrg,
    /// White dwarf.
    Wd,
    /// Neutron star or black hole precursor (undetectable).
    NsBh,
    /// Does not exist (sentinel mass).
    Dne,
}

impl StarStatus {
    /// Returns the numeric stage code used in the debug CMD track.
    pub fn code(&self) -> i32 {
        match self {
            StarStatus::Msrg => 1,
            StarStatus::Wd => 3,
            StarStatus::NsBh => 4,
            StarStatus::Dne => 9,
        }
    }
}

/// One stellar component with its sampled mass.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Star {
    pub mass: f64,
}

impl Star {
    /// Classifies this component against the cluster's mass boundaries.
    ///
    /// `turnoff_mass` is the main-sequence turnoff of the current isochrone;
    /// when the cluster parameters fall off-grid, callers pass
    /// `cluster.m_wd_up()` as the fallback boundary.
    pub fn status(&self, cluster: &Cluster, turnoff_mass: f64) -> StarStatus {
        if self.mass <= EPS {
            StarStatus::Dne
        } else if self.mass > cluster.m_wd_up() {
            StarStatus::NsBh
        } else if self.mass > turnoff_mass {
            StarStatus::Wd
        } else {
            StarStatus::Msrg
        }
    }
}

/// A cataloged (possibly binary) stellar system.
///
/// Created at startup from the mass-chain star count and long-lived for the
/// run. The observed photometry and status code are refreshed from the
/// scatter stream; the component masses are refreshed from the mass chains
/// once a row classifies the system as a cluster member.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StellarSystem {
    pub name: String,
    pub primary: Star,
    pub secondary: Star,
    /// Observed magnitudes, one per active filter.
    pub obs_phot: Vec<f64>,
    /// Observed-status code read from the scatter stream.
    pub observed_status: i32,
}

impl StellarSystem {
    pub fn new(n_active_filters: usize) -> Self {
        StellarSystem {
            name: String::new(),
            primary: Star::default(),
            secondary: Star::default(),
            obs_phot: vec![0.0; n_active_filters],
            observed_status: 0,
        }
    }

    /// Sets the secondary mass as a ratio of the primary mass.
    pub fn set_mass_ratio(&mut self, ratio: f64) {
        self.secondary.mass = self.primary.mass * ratio;
    }

    /// Secondary-to-primary mass ratio; 0 when the primary has no mass.
    pub fn mass_ratio(&self) -> f64 {
        if self.primary.mass > EPS {
            self.secondary.mass / self.primary.mass
        } else {
            0.0
        }
    }
}

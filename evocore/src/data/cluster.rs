use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Number of sampled cluster parameters in a chain row.
pub const NPARAMS: usize = 5;

/// Tolerance for stuck-chain detection and field-star classification.
///
/// A sampled value that moves by less than `EPS` between consecutive
/// iterations counts as stuck; a primary mass below `EPS` marks a field star.
pub const EPS: f64 = 1e-10;

/// The cluster parameters sampled by the MCMC, in chain-column order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    LogAge,
    Helium,
    FeH,
    Modulus,
    Absorption,
}

impl ParamKind {
    pub const ALL: [ParamKind; NPARAMS] = [
        ParamKind::LogAge,
        ParamKind::Helium,
        ParamKind::FeH,
        ParamKind::Modulus,
        ParamKind::Absorption,
    ];

    /// Returns the `ParamKind` for a chain-column index.
    pub fn from_index(index: usize) -> Option<ParamKind> {
        Self::ALL.get(index).copied()
    }

    /// Column label used in the parameter summary table.
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::LogAge => "logAge",
            ParamKind::Helium => "Y",
            ParamKind::FeH => "[Fe/H]",
            ParamKind::Modulus => "modulus",
            ParamKind::Absorption => "absorption",
        }
    }
}

impl Display for ParamKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cluster-level state shared by photometric synthesis.
///
/// The parameter vector is overwritten once per accepted chain row during
/// accumulation and once with the finalized means before the synthetic CMD
/// track is generated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cluster {
    params: [f64; NPARAMS],
    pub carbonicity: f64,
    m_wd_up: f64,
}

impl Cluster {
    pub fn new(m_wd_up: f64, carbonicity: f64) -> Self {
        Cluster {
            params: [0.0; NPARAMS],
            carbonicity,
            m_wd_up,
        }
    }

    pub fn param(&self, kind: ParamKind) -> f64 {
        self.params[kind as usize]
    }

    pub fn set_param(&mut self, index: usize, value: f64) {
        self.params[index] = value;
    }

    pub fn log_age(&self) -> f64 {
        self.param(ParamKind::LogAge)
    }

    pub fn helium(&self) -> f64 {
        self.param(ParamKind::Helium)
    }

    pub fn feh(&self) -> f64 {
        self.param(ParamKind::FeH)
    }

    pub fn modulus(&self) -> f64 {
        self.param(ParamKind::Modulus)
    }

    pub fn absorption(&self) -> f64 {
        self.param(ParamKind::Absorption)
    }

    /// Upper precursor-mass bound for white dwarf formation.
    pub fn m_wd_up(&self) -> f64 {
        self.m_wd_up
    }

    pub fn set_m_wd_up(&mut self, m_wd_up: f64) {
        self.m_wd_up = m_wd_up;
    }
}

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use evocore::models::ifmr::IfmrModel;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run configuration, loadable from a JSON file.
///
/// Every field has a default so a partial file (or none at all) is valid;
/// command-line flags override whatever the file provides.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Brightest magnitude accepted in the reference filter.
    pub min_mag: f64,
    /// Faintest magnitude accepted in the reference filter.
    pub max_mag: f64,
    /// Index of the reference filter among the active filters.
    pub mag_index: usize,
    /// Upper precursor-mass bound for white dwarf formation.
    pub m_wd_up: f64,
    /// Cluster carbon abundance passed through to the models.
    pub carbonicity: f64,
    /// Initial-final mass relation used for white dwarf columns.
    pub ifmr: IfmrModel,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            min_mag: 0.0,
            max_mag: 30.0,
            mag_index: 2,
            m_wd_up: 8.0,
            carbonicity: 0.38,
            ifmr: IfmrModel::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, SettingsError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

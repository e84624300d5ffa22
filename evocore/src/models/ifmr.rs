use serde::{Deserialize, Serialize};

/// Initial-final mass relations for white dwarf precursors.
///
/// Linear fits; the active relation is a run-level setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfmrModel {
    Weidemann,
    #[default]
    Williams,
    Kalirai,
}

impl IfmrModel {
    /// White dwarf mass for a given precursor mass.
    pub fn final_mass(&self, precursor_mass: f64) -> f64 {
        match self {
            IfmrModel::Weidemann => 0.394 + 0.109 * precursor_mass,
            IfmrModel::Williams => 0.339 + 0.129 * precursor_mass,
            IfmrModel::Kalirai => 0.428 + 0.109 * precursor_mass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_final_mass_is_linear() {
        let wd = IfmrModel::Williams;
        let at_three = wd.final_mass(3.0);
        assert_relative_eq!(at_three, 0.339 + 0.129 * 3.0, epsilon = 1e-12);
        // one-sigma spread used in the star table is a pure slope term
        let spread = wd.final_mass(3.0) - wd.final_mass(3.0 - 0.5);
        assert_relative_eq!(spread, 0.129 * 0.5, epsilon = 1e-12);
    }
}

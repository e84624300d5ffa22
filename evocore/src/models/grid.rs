use thiserror::Error;

use crate::data::filters::FilterSetName;

/// Recoverable lookup failures.
///
/// An out-of-grid request is a valid outcome of photometric synthesis: the
/// caller renders the component as undetectable (magnitude 99.999) rather
/// than aborting the run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GridError {
    #[error("mass {mass} outside the tabulated range [{min}, {max}]")]
    MassOutOfRange { mass: f64, min: f64, max: f64 },
    #[error("composition [Fe/H] = {feh}, Y = {y} outside the tabulated grid")]
    CompositionOutOfRange { feh: f64, y: f64 },
    #[error("isochrone line has no entries")]
    EmptyIsochrone,
}

/// Capability interface for a stellar model family.
///
/// One implementation per physical family; grid shape and file layout differ
/// per family, the lookup contract does not.
pub trait StellarModel: Sync {
    /// Whether the requested photometric system is available for this family.
    fn is_supported(&self, filter_set: FilterSetName) -> bool;

    /// Number of filter slots this family tabulates.
    fn num_filts(&self) -> usize;

    /// Absolute magnitudes per filter slot for a single star.
    fn lookup(&self, log_age: f64, feh: f64, y: f64, mass: f64) -> Result<Vec<f64>, GridError>;

    /// Main-sequence turnoff mass of the isochrone nearest to the request.
    fn turnoff_mass(&self, log_age: f64, feh: f64, y: f64) -> Result<f64, GridError>;
}

/// One tabulated isochrone: masses ascending, one magnitude vector per mass.
#[derive(Clone, Debug)]
pub struct Isochrone {
    pub log_age: f64,
    pub mass: Vec<f64>,
    pub mags: Vec<Vec<f64>>,
}

impl Isochrone {
    /// Linearly interpolates the magnitude vector at `mass`.
    pub fn interpolate_mass(&self, mass: f64) -> Result<Vec<f64>, GridError> {
        let (first, last) = match (self.mass.first(), self.mass.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(GridError::EmptyIsochrone),
        };
        if mass < first || mass > last {
            return Err(GridError::MassOutOfRange {
                mass,
                min: first,
                max: last,
            });
        }

        // index of the first tabulated mass >= the request
        let hi = self.mass.partition_point(|m| *m < mass);
        if hi == 0 {
            return Ok(self.mags[0].clone());
        }
        let lo = hi - 1;
        let span = self.mass[hi] - self.mass[lo];
        let w = if span > 0.0 {
            (mass - self.mass[lo]) / span
        } else {
            0.0
        };

        let blended = self.mags[lo]
            .iter()
            .zip(self.mags[hi].iter())
            .map(|(a, b)| a + w * (b - a))
            .collect();
        Ok(blended)
    }

    /// Highest tabulated mass on this line (the turnoff/AGB-tip mass).
    pub fn turnoff_mass(&self) -> Result<f64, GridError> {
        self.mass.last().copied().ok_or(GridError::EmptyIsochrone)
    }
}

/// All isochrones tabulated for one ([Fe/H], Y) grid cell, ages ascending.
#[derive(Clone, Debug)]
pub struct IsochroneSet {
    pub feh: f64,
    pub y: f64,
    pub isochrones: Vec<Isochrone>,
}

impl IsochroneSet {
    /// The tabulated age line closest to `log_age`.
    pub fn nearest_age(&self, log_age: f64) -> Result<&Isochrone, GridError> {
        self.isochrones
            .iter()
            .min_by(|a, b| {
                let da = (a.log_age - log_age).abs();
                let db = (b.log_age - log_age).abs();
                da.total_cmp(&db)
            })
            .ok_or(GridError::EmptyIsochrone)
    }
}

/// Finds the bracketing interval of `x` in ascending `values`.
///
/// Returns the lower index and the linear weight of the upper neighbor, or
/// `None` when `x` falls outside the tabulated range.
pub fn bracket(values: &[f64], x: f64) -> Option<(usize, f64)> {
    let (first, last) = (values.first()?, values.last()?);
    if x < *first || x > *last {
        return None;
    }
    if values.len() == 1 {
        return Some((0, 0.0));
    }

    let hi = values.partition_point(|v| *v < x).max(1);
    let lo = hi - 1;
    let span = values[hi] - values[lo];
    let w = if span > 0.0 { (x - values[lo]) / span } else { 0.0 };
    Some((lo, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line() -> Isochrone {
        Isochrone {
            log_age: 9.0,
            mass: vec![0.5, 1.0, 2.0],
            mags: vec![vec![10.0, 12.0], vec![8.0, 10.0], vec![4.0, 6.0]],
        }
    }

    #[test]
    fn test_mass_interpolation_midpoint() {
        let mags = line().interpolate_mass(0.75).unwrap();
        assert_relative_eq!(mags[0], 9.0, epsilon = 1e-12);
        assert_relative_eq!(mags[1], 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mass_interpolation_at_grid_point() {
        let mags = line().interpolate_mass(1.0).unwrap();
        assert_relative_eq!(mags[0], 8.0, epsilon = 1e-12);
        let mags = line().interpolate_mass(0.5).unwrap();
        assert_relative_eq!(mags[0], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mass_out_of_range() {
        assert!(matches!(
            line().interpolate_mass(2.5),
            Err(GridError::MassOutOfRange { .. })
        ));
        assert!(matches!(
            line().interpolate_mass(0.1),
            Err(GridError::MassOutOfRange { .. })
        ));
    }

    #[test]
    fn test_turnoff_is_last_mass() {
        assert_eq!(line().turnoff_mass().unwrap(), 2.0);
    }

    #[test]
    fn test_nearest_age() {
        let set = IsochroneSet {
            feh: 0.0,
            y: 0.27,
            isochrones: vec![
                Isochrone { log_age: 8.0, mass: vec![1.0], mags: vec![vec![5.0]] },
                Isochrone { log_age: 9.0, mass: vec![1.0], mags: vec![vec![6.0]] },
            ],
        };
        assert_eq!(set.nearest_age(8.4).unwrap().log_age, 8.0);
        assert_eq!(set.nearest_age(8.6).unwrap().log_age, 9.0);
    }

    #[test]
    fn test_bracket() {
        let values = [0.0, 1.0, 3.0];
        assert_eq!(bracket(&values, -0.1), None);
        assert_eq!(bracket(&values, 3.1), None);
        let (lo, w) = bracket(&values, 2.0).unwrap();
        assert_eq!(lo, 1);
        assert_relative_eq!(w, 0.5, epsilon = 1e-12);
        let (lo, w) = bracket(&values, 0.0).unwrap();
        assert_eq!(lo, 0);
        assert_relative_eq!(w, 0.0, epsilon = 1e-12);
        let (lo, w) = bracket(&values, 3.0).unwrap();
        assert_eq!(lo, 1);
        assert_relative_eq!(w, 1.0, epsilon = 1e-12);
    }
}

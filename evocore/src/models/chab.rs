use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use itertools::Itertools;
use thiserror::Error;

use crate::data::filters::FilterSetName;
use crate::models::grid::{bracket, GridError, Isochrone, IsochroneSet, StellarModel};

/// Grid shape of the Chaboyer-Dotter isochrone family.
pub const N_CHAB_FILTS: usize = 8;
pub const N_CHAB_Z: usize = 4;
pub const N_CHAB_Y: usize = 5;
pub const N_CHAB_AGES: usize = 19;

/// Fatal errors while loading a model grid table.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model grid I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: cannot parse '{token}' as a number")]
    Parse { line: usize, token: String },
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid shape mismatch: {0}")]
    Shape(String),
}

/// The Chaboyer-Dotter main-sequence/RGB model family.
///
/// Tabulated on 4 metallicities x 5 helium abundances x 19 ages with 8
/// UBVRIJHK filters. Lookups blend bilinearly across the ([Fe/H], Y) cell
/// containing the request, pick the nearest age line in each corner, and
/// interpolate magnitudes linearly in mass within each line.
#[derive(Clone, Debug)]
pub struct ChabModel {
    feh_values: Vec<f64>,
    y_values: Vec<f64>,
    /// Cell tables indexed by `feh_index * y_count + y_index`.
    sets: Vec<IsochroneSet>,
}

impl ChabModel {
    /// Assembles a model from per-cell isochrone sets.
    ///
    /// `sets` must hold one entry per ([Fe/H], Y) combination, ordered with
    /// the helium index varying fastest. Shape against the published family
    /// dimensions is only enforced by [`ChabModel::load`], so reduced grids
    /// can be constructed for testing.
    pub fn new(
        feh_values: Vec<f64>,
        y_values: Vec<f64>,
        sets: Vec<IsochroneSet>,
    ) -> Result<Self, ModelLoadError> {
        if sets.len() != feh_values.len() * y_values.len() {
            return Err(ModelLoadError::Shape(format!(
                "{} cells for {} x {} grid",
                sets.len(),
                feh_values.len(),
                y_values.len()
            )));
        }
        if !feh_values.windows(2).all(|w| w[0] < w[1]) || !y_values.windows(2).all(|w| w[0] < w[1])
        {
            return Err(ModelLoadError::Shape(
                "grid axis values must be strictly ascending".to_string(),
            ));
        }
        Ok(ChabModel {
            feh_values,
            y_values,
            sets,
        })
    }

    /// Loads the family table from a whitespace-delimited text file.
    ///
    /// Each data line carries `[Fe/H] Y logAge mass` followed by one absolute
    /// magnitude per filter slot; lines starting with `#` are comments. The
    /// assembled grid must match the published 4 x 5 x 19 family shape.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ModelLoadError> {
        const FIELDS: usize = 4 + N_CHAB_FILTS;

        // (feh, y, log_age, mass, mags)
        let mut entries: Vec<(f64, f64, f64, f64, Vec<f64>)> = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut fields = Vec::with_capacity(FIELDS);
            for token in trimmed.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| ModelLoadError::Parse {
                    line: line_no,
                    token: token.to_string(),
                })?;
                fields.push(value);
            }
            if fields.len() != FIELDS {
                return Err(ModelLoadError::FieldCount {
                    line: line_no,
                    expected: FIELDS,
                    found: fields.len(),
                });
            }

            let mags = fields.split_off(4);
            entries.push((fields[0], fields[1], fields[2], fields[3], mags));
        }

        let axis = |values: Vec<f64>| -> Vec<f64> {
            values
                .into_iter()
                .sorted_by(f64::total_cmp)
                .dedup_by(|a, b| a == b)
                .collect()
        };
        let feh_values = axis(entries.iter().map(|e| e.0).collect());
        let y_values = axis(entries.iter().map(|e| e.1).collect());

        if feh_values.len() != N_CHAB_Z || y_values.len() != N_CHAB_Y {
            return Err(ModelLoadError::Shape(format!(
                "{} metallicities x {} helium abundances, expected {} x {}",
                feh_values.len(),
                y_values.len(),
                N_CHAB_Z,
                N_CHAB_Y
            )));
        }

        let mut sets = Vec::with_capacity(N_CHAB_Z * N_CHAB_Y);
        for &feh in &feh_values {
            for &y in &y_values {
                let cell: Vec<&(f64, f64, f64, f64, Vec<f64>)> = entries
                    .iter()
                    .filter(|e| e.0 == feh && e.1 == y)
                    .collect();
                let ages: Vec<f64> = axis(cell.iter().map(|e| e.2).collect());
                if ages.len() != N_CHAB_AGES {
                    return Err(ModelLoadError::Shape(format!(
                        "{} ages in cell [Fe/H] = {}, Y = {}, expected {}",
                        ages.len(),
                        feh,
                        y,
                        N_CHAB_AGES
                    )));
                }

                let mut isochrones = Vec::with_capacity(ages.len());
                for &log_age in &ages {
                    let mut points: Vec<(f64, Vec<f64>)> = cell
                        .iter()
                        .filter(|e| e.2 == log_age)
                        .map(|e| (e.3, e.4.clone()))
                        .collect();
                    points.sort_by(|a, b| a.0.total_cmp(&b.0));
                    isochrones.push(Isochrone {
                        log_age,
                        mass: points.iter().map(|p| p.0).collect(),
                        mags: points.into_iter().map(|p| p.1).collect(),
                    });
                }
                sets.push(IsochroneSet { feh, y, isochrones });
            }
        }

        Self::new(feh_values, y_values, sets)
    }

    fn cell(&self, feh_index: usize, y_index: usize) -> &IsochroneSet {
        &self.sets[feh_index * self.y_values.len() + y_index]
    }

    fn nearest_index(values: &[f64], x: f64) -> usize {
        values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

impl StellarModel for ChabModel {
    fn is_supported(&self, filter_set: FilterSetName) -> bool {
        matches!(filter_set, FilterSetName::UBVRIJHK)
    }

    fn num_filts(&self) -> usize {
        N_CHAB_FILTS
    }

    fn lookup(&self, log_age: f64, feh: f64, y: f64, mass: f64) -> Result<Vec<f64>, GridError> {
        let (zi, wz) = bracket(&self.feh_values, feh)
            .ok_or(GridError::CompositionOutOfRange { feh, y })?;
        let (yi, wy) =
            bracket(&self.y_values, y).ok_or(GridError::CompositionOutOfRange { feh, y })?;
        let zj = (zi + 1).min(self.feh_values.len() - 1);
        let yj = (yi + 1).min(self.y_values.len() - 1);

        // magnitudes at the four cell corners, nearest age line each
        let corner = |fi: usize, hi: usize| -> Result<Vec<f64>, GridError> {
            self.cell(fi, hi).nearest_age(log_age)?.interpolate_mass(mass)
        };
        let m00 = corner(zi, yi)?;
        let m01 = corner(zi, yj)?;
        let m10 = corner(zj, yi)?;
        let m11 = corner(zj, yj)?;

        let mags = (0..N_CHAB_FILTS)
            .map(|f| {
                let lo = m00[f] + wy * (m01[f] - m00[f]);
                let hi = m10[f] + wy * (m11[f] - m10[f]);
                lo + wz * (hi - lo)
            })
            .collect();
        Ok(mags)
    }

    fn turnoff_mass(&self, log_age: f64, feh: f64, y: f64) -> Result<f64, GridError> {
        if bracket(&self.feh_values, feh).is_none() || bracket(&self.y_values, y).is_none() {
            return Err(GridError::CompositionOutOfRange { feh, y });
        }
        let zi = Self::nearest_index(&self.feh_values, feh);
        let yi = Self::nearest_index(&self.y_values, y);
        self.cell(zi, yi).nearest_age(log_age)?.turnoff_mass()
    }
}

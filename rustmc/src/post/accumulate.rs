use std::io::BufRead;

use rayon::prelude::*;

use evocore::algorithm::photometry::combined_mags;
use evocore::algorithm::stats::{PhotSums, RunningStats};
use evocore::data::cluster::{Cluster, EPS, NPARAMS};
use evocore::data::filters::FilterSet;
use evocore::data::star::StellarSystem;
use evocore::models::grid::StellarModel;

use crate::chain::error::ChainError;
use crate::chain::reader::ChainReader;

/// Classifies a star's sampled primary mass for one row.
///
/// The sampler writes a sentinel (non-positive) mass when the star is drawn
/// as field-star contamination; anything materially positive is a cluster
/// member for that row.
pub fn is_cluster_member(primary_mass: f64) -> bool {
    primary_mass > EPS
}

/// Final accumulator state over the whole chain.
#[derive(Clone, Debug)]
pub struct ChainStats {
    /// Total accepted rows.
    pub rows: u64,
    /// One block per cluster parameter, fed every row.
    pub params: Vec<RunningStats>,
    /// One block per star per component, fed on member rows only.
    pub mass: Vec<[RunningStats; 2]>,
    /// Synthesized-photometry sums per star, fed on member rows only.
    pub phot: Vec<PhotSums>,
}

impl ChainStats {
    pub fn new(n_stars: usize, n_filters: usize) -> Self {
        ChainStats {
            rows: 0,
            params: vec![RunningStats::new(); NPARAMS],
            mass: vec![[RunningStats::new(), RunningStats::new()]; n_stars],
            phot: vec![PhotSums::new(n_filters); n_stars],
        }
    }

    /// Rows on which the star was a cluster member.
    pub fn member_rows(&self, star: usize) -> u64 {
        self.mass[star][0].count()
    }

    /// Cluster-membership probability: member rows over total rows.
    pub fn membership_probability(&self, star: usize) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.member_rows(star) as f64 / self.rows as f64
        }
    }
}

/// Drains the reader and folds every row into the running statistics.
///
/// Parameter blocks see every row; mass and photometry blocks only see rows
/// on which the star is classified a member, with per-star arrival order
/// preserved (the stuck/step diagnostics depend on the immediately preceding
/// accepted value). Photometric synthesis for the member stars of a row is
/// independent per star and runs in parallel.
pub fn accumulate_chain<R: BufRead>(
    reader: &mut ChainReader<R>,
    stars: &mut [StellarSystem],
    cluster: &mut Cluster,
    model: &dyn StellarModel,
    filters: &FilterSet,
) -> Result<ChainStats, ChainError> {
    let mut stats = ChainStats::new(stars.len(), filters.len());

    while let Some(row) = reader.next_row(stars, cluster, model)? {
        for (p, value) in row.params.iter().enumerate() {
            cluster.set_param(p, *value);
            stats.params[p].update(*value);
        }

        for (j, star) in stars.iter_mut().enumerate() {
            let [primary, secondary] = row.masses[j];
            if !is_cluster_member(primary) {
                continue;
            }
            stats.mass[j][0].update(primary);
            stats.mass[j][1].update(secondary);
            star.primary.mass = primary;
            star.secondary.mass = secondary;
        }

        let members: Vec<usize> = (0..stars.len())
            .filter(|j| is_cluster_member(row.masses[*j][0]))
            .collect();
        let row_stars: &[StellarSystem] = stars;
        let row_cluster: &Cluster = cluster;
        let synthesized: Vec<(usize, Vec<f64>)> = members
            .par_iter()
            .map(|&j| (j, combined_mags(&row_stars[j], row_cluster, model, filters)))
            .collect();
        for (j, mags) in synthesized {
            stats.phot[j].add(&mags);
        }

        stats.rows += 1;
    }

    log::info!(
        "accumulated {} chain rows for {} stars",
        stats.rows,
        stars.len()
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mass::MassChain;
    use crate::chain::params::ParamChain;
    use crate::chain::reader::MagWindow;
    use crate::chain::scatter::ScatterReader;
    use approx::assert_relative_eq;
    use evocore::data::filters::FilterSetName;
    use evocore::models::grid::GridError;

    /// Magnitude is `10 + filter_slot - mass` for masses up to 2, off-grid
    /// above; age and composition are ignored.
    struct ToyModel;

    impl StellarModel for ToyModel {
        fn is_supported(&self, filter_set: FilterSetName) -> bool {
            matches!(filter_set, FilterSetName::UBVRIJHK)
        }

        fn num_filts(&self) -> usize {
            8
        }

        fn lookup(
            &self,
            _log_age: f64,
            _feh: f64,
            _y: f64,
            mass: f64,
        ) -> Result<Vec<f64>, GridError> {
            if mass > 2.0 {
                return Err(GridError::MassOutOfRange {
                    mass,
                    min: 0.0,
                    max: 2.0,
                });
            }
            Ok((0..8).map(|f| 10.0 + f as f64 - mass).collect())
        }

        fn turnoff_mass(&self, _log_age: f64, _feh: f64, _y: f64) -> Result<f64, GridError> {
            Ok(2.0)
        }
    }

    const PARAMS: &str = "header\n\
                          start 1 9.0 0 0.27 0 -0.5 0 12.0 0 0.0\n\
                          1 9.0\n\
                          2 9.2\n\
                          3 9.4\n\
                          4 9.6\n";

    fn build(mass1: &str, mass2: &str) -> (ChainReader<std::io::Cursor<String>>, FilterSet) {
        let cursor = |s: &str| std::io::Cursor::new(s.to_string());
        let scatter_text = "0 1 1 0 0 0 0 0\nheader line two\n".to_string()
            + &"s1 14.0 13.5 0 0 0 0 1\n".repeat(8);
        let params = ParamChain::new(cursor(PARAMS)).unwrap();
        let mass1 = MassChain::new(cursor(mass1)).unwrap();
        let mass2 = MassChain::new(cursor(mass2)).unwrap();
        let scatter = ScatterReader::new(cursor(&scatter_text)).unwrap();
        let filters = scatter.filters().clone();
        let window = MagWindow::new(0.0, 30.0, 1, filters.len()).unwrap();
        let reader = ChainReader::new(params, mass1, mass2, scatter, window).unwrap();
        (reader, filters)
    }

    fn accumulate(mass1: &str, mass2: &str) -> (ChainStats, Vec<StellarSystem>, Cluster) {
        let (mut reader, filters) = build(mass1, mass2);
        let mut stars = vec![StellarSystem::new(filters.len())];
        let mut cluster = Cluster::new(8.0, 0.38);
        let stats =
            accumulate_chain(&mut reader, &mut stars, &mut cluster, &ToyModel, &filters).unwrap();
        (stats, stars, cluster)
    }

    #[test]
    fn test_field_rows_are_consumed_but_excluded() {
        // field, member, member, field
        let (stats, _, _) = accumulate(
            "h h h h h n 1\n0.0\n1.2\n1.2\n0.0\n",
            "h h h h h n 1\n0.0\n0.6\n0.6\n0.0\n",
        );
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.member_rows(0), 2);
        assert_relative_eq!(stats.membership_probability(0), 0.5, epsilon = 1e-12);
        // only the member rows feed the mass statistics
        assert_relative_eq!(stats.mass[0][0].mean(), 1.2, epsilon = 1e-12);
        assert_eq!(stats.mass[0][0].sample_variance(), 0.0);
        assert_eq!(stats.mass[0][0].stuck(), 1);
    }

    #[test]
    fn test_parameters_fed_every_row() {
        let (stats, _, _) = accumulate(
            "h h h h h n 1\n0.0\n1.2\n1.2\n0.0\n",
            "h h h h h n 1\n0.0\n0.6\n0.6\n0.0\n",
        );
        assert_eq!(stats.params[0].count(), 4);
        assert_relative_eq!(stats.params[0].mean(), 9.3, epsilon = 1e-12);
        // held parameters accumulate their constant header value
        assert_relative_eq!(stats.params[1].mean(), 0.27, epsilon = 1e-12);
        assert_eq!(stats.params[1].stuck(), 3);
    }

    #[test]
    fn test_photometry_accumulates_member_rows() {
        let (stats, _, cluster) = accumulate(
            "h h h h h n 1\n0.0\n1.0\n1.0\n1.0\n",
            "h h h h h n 1\n0.0\n0.0\n0.0\n0.0\n",
        );
        let n = stats.member_rows(0);
        assert_eq!(n, 3);
        // single 1.0-mass star: B slot = 10 + 1 - 1 plus the held modulus
        assert_eq!(cluster.modulus(), 12.0);
        assert_relative_eq!(stats.phot[0].mean(0, n).unwrap(), 22.0, epsilon = 1e-9);
        assert!(stats.phot[0].sample_variance(0, n).abs() < 1e-9);
    }

    #[test]
    fn test_membership_extremes() {
        let (always, _, _) = accumulate(
            "h h h h h n 1\n1.0\n1.0\n1.0\n1.0\n",
            "h h h h h n 1\n0.0\n0.0\n0.0\n0.0\n",
        );
        assert_eq!(always.membership_probability(0), 1.0);

        let (never, _, _) = accumulate(
            "h h h h h n 1\n0.0\n0.0\n0.0\n0.0\n",
            "h h h h h n 1\n0.0\n0.0\n0.0\n0.0\n",
        );
        assert_eq!(never.membership_probability(0), 0.0);
        assert_eq!(never.mass[0][0].mean(), 0.0);
    }
}

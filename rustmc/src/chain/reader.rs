use std::io::BufRead;

use evocore::data::cluster::{Cluster, NPARAMS};
use evocore::data::star::{StarStatus, StellarSystem};
use evocore::models::grid::StellarModel;

use crate::chain::error::ChainError;
use crate::chain::mass::MassChain;
use crate::chain::params::ParamChain;
use crate::chain::scatter::ScatterReader;

/// Photometric acceptance window on the reference filter.
#[derive(Clone, Copy, Debug)]
pub struct MagWindow {
    pub min_mag: f64,
    pub max_mag: f64,
    /// Index into the active filter set; restricted to the first three.
    pub index: usize,
}

impl MagWindow {
    pub fn new(
        min_mag: f64,
        max_mag: f64,
        index: usize,
        n_active_filters: usize,
    ) -> Result<Self, ChainError> {
        if index > 2 {
            return Err(ChainError::BadMagIndex(index));
        }
        if index >= n_active_filters {
            return Err(ChainError::MagIndexOutOfRange {
                index,
                active: n_active_filters,
            });
        }
        Ok(MagWindow {
            min_mag,
            max_mag,
            index,
        })
    }

    pub fn contains(&self, mag: f64) -> bool {
        (self.min_mag..=self.max_mag).contains(&mag)
    }
}

/// One MCMC iteration's sample: the full parameter vector and one mass pair
/// per star. Produced by the reader, consumed immediately, not retained.
#[derive(Clone, Debug)]
pub struct ChainRow {
    pub params: [f64; NPARAMS],
    pub masses: Vec<[f64; 2]>,
}

/// Synchronized reader over the parameter chain, the two mass chains and the
/// scatter stream.
///
/// The row sequence is finite and not restartable: it ends as soon as any
/// required stream is exhausted, whichever of the two mass chains or the
/// parameter chain that is. Per star and logical row, scatter records are
/// re-read while the star's assigned status is main-sequence/red-giant and
/// its reference-filter magnitude falls outside the window, so the reader
/// may consume several physical scatter rows per chain row.
pub struct ChainReader<R> {
    params: ParamChain<R>,
    mass: [MassChain<R>; 2],
    scatter: ScatterReader<R>,
    window: MagWindow,
    n_stars: usize,
}

impl<R: BufRead> ChainReader<R> {
    pub fn new(
        params: ParamChain<R>,
        primary_mass: MassChain<R>,
        secondary_mass: MassChain<R>,
        scatter: ScatterReader<R>,
        window: MagWindow,
    ) -> Result<Self, ChainError> {
        if primary_mass.star_count() != secondary_mass.star_count() {
            return Err(ChainError::StarCountMismatch(
                primary_mass.star_count(),
                secondary_mass.star_count(),
            ));
        }
        let n_stars = primary_mass.star_count();
        Ok(ChainReader {
            params,
            mass: [primary_mass, secondary_mass],
            scatter,
            window,
            n_stars,
        })
    }

    pub fn star_count(&self) -> usize {
        self.n_stars
    }

    pub fn filters(&self) -> &evocore::data::filters::FilterSet {
        self.scatter.filters()
    }

    /// Produces the next synchronized row, refreshing the stars' scatter
    /// state along the way; `None` once any required stream has ended.
    ///
    /// The membership window check uses each star's currently assigned
    /// primary mass, i.e. the value from the previously accepted row.
    pub fn next_row(
        &mut self,
        stars: &mut [StellarSystem],
        cluster: &Cluster,
        model: &dyn StellarModel,
    ) -> Result<Option<ChainRow>, ChainError> {
        debug_assert_eq!(stars.len(), self.n_stars);

        let mut primary = vec![0.0; self.n_stars];
        let mut secondary = vec![0.0; self.n_stars];
        if !self.mass[0].read_row(&mut primary)? || !self.mass[1].read_row(&mut secondary)? {
            return Ok(None);
        }

        let turnoff = model
            .turnoff_mass(cluster.log_age(), cluster.feh(), cluster.helium())
            .unwrap_or_else(|_| cluster.m_wd_up());
        for star in stars.iter_mut() {
            loop {
                if !self.scatter.read_record(star)? {
                    return Ok(None);
                }
                let in_window = self.window.contains(star.obs_phot[self.window.index]);
                if star.primary.status(cluster, turnoff) == StarStatus::Msrg && !in_window {
                    continue;
                }
                break;
            }
        }

        let params = match self.params.read_row()? {
            Some(params) => params,
            None => return Ok(None),
        };

        let masses = primary
            .into_iter()
            .zip(secondary)
            .map(|(p, s)| [p, s])
            .collect();
        Ok(Some(ChainRow { params, masses }))
    }
}

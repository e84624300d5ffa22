use std::io;
use std::io::Write;

use evocore::algorithm::photometry::{combined_mags, UNDETECTABLE_MAG};
use evocore::data::cluster::{Cluster, ParamKind};
use evocore::data::filters::FilterSet;
use evocore::data::star::{StarStatus, StellarSystem};
use evocore::models::grid::StellarModel;
use evocore::models::ifmr::IfmrModel;

use crate::post::accumulate::ChainStats;

/// Mass spacing of the synthetic debug track.
const TRACK_STEP: f64 = 0.01;

fn turnoff(cluster: &Cluster, model: &dyn StellarModel) -> f64 {
    model
        .turnoff_mass(cluster.log_age(), cluster.feh(), cluster.helium())
        .unwrap_or_else(|_| cluster.m_wd_up())
}

/// Writes the per-star mass/photometry summary table.
///
/// One row per cataloged star: per-component mass statistics, the
/// white-dwarf final-mass pair (zero unless the star classifies as a white
/// dwarf at the mean parameters), membership probability and member-row
/// count, then mean/variance of the synthesized photometry per active
/// filter. Pure function of the finalized accumulator state.
pub fn write_star_table<W: Write>(
    w: &mut W,
    stars: &[StellarSystem],
    stats: &ChainStats,
    cluster: &Cluster,
    model: &dyn StellarModel,
    filters: &FilterSet,
    ifmr: IfmrModel,
) -> io::Result<()> {
    write!(w, "     Star    ")?;
    for m in 1..=2 {
        write!(
            w,
            "meanmass{m}  sigmass{m}   minmass{m}   maxmass{m} stuck{m} meanStep{m} "
        )?;
        if m == 1 {
            write!(w, "meanWDMass{m} sigWDmass{m} ")?;
        }
        write!(w, "CSprob{m} Niter{m}   ")?;
    }
    for i in 0..filters.len() {
        write!(w, "{:>8} ", format!("mean{}", filters.name(i)))?;
        write!(w, "  {:>8}   ", format!("var{}", filters.name(i)))?;
    }
    writeln!(w)?;

    let turnoff_mass = turnoff(cluster, model);
    for (j, star) in stars.iter().enumerate() {
        let n = stats.member_rows(j);
        write!(w, "{:>9}  ", star.name)?;

        for m in 0..2 {
            let block = &stats.mass[j][m];
            write!(
                w,
                "{:11.5} {:9.5} {:10.5} {:10.5} {:6}  {:8.6}  ",
                block.mean(),
                block.sigma(),
                block.min(),
                block.max(),
                block.stuck(),
                block.mean_step()
            )?;

            if m == 0 {
                let (wd_mean, wd_sigma) =
                    if star.primary.status(cluster, turnoff_mass) == StarStatus::Wd {
                        let mean = ifmr.final_mass(block.mean());
                        (mean, mean - ifmr.final_mass(block.mean() - block.sigma()))
                    } else {
                        (0.0, 0.0)
                    };
                write!(w, "{:10.5}  {:9.3e}  ", wd_mean, wd_sigma)?;
            }
            write!(w, "{:6.4} {:6} ", stats.membership_probability(j), n)?;
        }

        for i in 0..filters.len() {
            let mean = stats.phot[j].mean(i, n).unwrap_or(UNDETECTABLE_MAG);
            if mean < 99.0 {
                write!(w, "{:10.6} {:10.4e} ", mean, stats.phot[j].sample_variance(i, n))?;
            } else {
                write!(w, "{:10.6} {:10.4e} ", UNDETECTABLE_MAG, 0.0)?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Writes the per-parameter statistics table.
pub fn write_param_table<W: Write>(w: &mut W, stats: &ChainStats) -> io::Result<()> {
    writeln!(
        w,
        "Parameter     mean     sigma       min      max    stuck  meanStep"
    )?;
    for (p, kind) in ParamKind::ALL.iter().enumerate() {
        let block = &stats.params[p];
        writeln!(
            w,
            "{:<10} {:8.5} {:9.5} {:10.5} {:8.5} {:6}  {:8.5}",
            kind.label(),
            block.mean(),
            block.sigma(),
            block.min(),
            block.max(),
            block.stuck(),
            block.mean_step()
        )?;
    }
    Ok(())
}

/// Writes the synthetic debug CMD track.
///
/// Sweeps single-star systems from mass 0 to the white-dwarf upper bound in
/// fixed steps at the (already applied) mean cluster parameters. Points
/// undetectable in the reference filter are dropped; on the
/// main-sequence/red-giant branch a point is only emitted when it is
/// brighter than the previously emitted one, turning the mass grid into a
/// quasi-isochrone curve.
pub fn write_debug_track<W: Write>(
    w: &mut W,
    cluster: &Cluster,
    model: &dyn StellarModel,
    filters: &FilterSet,
) -> io::Result<()> {
    write!(w, " mass stage1")?;
    for i in 0..filters.len() {
        write!(w, "          {}", filters.name(i))?;
    }
    writeln!(w)?;

    let turnoff_mass = turnoff(cluster, model);
    let n_points = (cluster.m_wd_up() * 100.0) as usize + 1;
    let mut prev_ref_mag = 100.0;

    for i in 0..n_points {
        let mut system = StellarSystem::new(filters.len());
        system.primary.mass = i as f64 * TRACK_STEP;

        let mags = combined_mags(&system, cluster, model, filters);
        if mags[0] >= 90.0 {
            continue;
        }

        let status = system.primary.status(cluster, turnoff_mass);
        if status == StarStatus::Msrg {
            if mags[0] >= prev_ref_mag {
                // turn-back point, drop it
                continue;
            }
            prev_ref_mag = mags[0];
        }

        write!(w, "{:5.2} {:6} ", system.primary.mass, status.code())?;
        for mag in &mags {
            write!(w, "{:10.6} ", mag)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::accumulate::ChainStats;
    use evocore::data::filters::{FilterSetName, FILTS};
    use evocore::models::grid::GridError;

    /// V-shaped track: reference magnitude falls until mass 1.0, then rises.
    struct TurnbackModel;

    impl StellarModel for TurnbackModel {
        fn is_supported(&self, filter_set: FilterSetName) -> bool {
            matches!(filter_set, FilterSetName::UBVRIJHK)
        }

        fn num_filts(&self) -> usize {
            FILTS
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
            Ok((0..FILTS).map(|f| 10.0 + f as f64 + (mass - 1.0).abs()).collect())
        }

        fn turnoff_mass(&self, _log_age: f64, _feh: f64, _y: f64) -> Result<f64, GridError> {
            Ok(2.0)
        }
    }

    fn filters() -> FilterSet {
        let mut flags = [false; FILTS];
        flags[1] = true;
        flags[2] = true;
        FilterSet::from_flags(&flags)
    }

    fn fixture() -> (Vec<StellarSystem>, ChainStats, Cluster) {
        let filters = filters();
        let mut stars = vec![
            StellarSystem::new(filters.len()),
            StellarSystem::new(filters.len()),
        ];
        stars[0].name = "s1".to_string();
        stars[0].primary.mass = 1.2;
        stars[1].name = "s2".to_string();

        let mut stats = ChainStats::new(2, filters.len());
        stats.rows = 4;
        for mass in [1.1, 1.2, 1.3] {
            stats.mass[0][0].update(mass);
            stats.mass[0][1].update(0.0);
            stats.phot[0].add(&[14.0 + mass, 13.0 + mass]);
        }

        let mut cluster = Cluster::new(2.0, 0.38);
        cluster.set_param(0, 9.0);
        (stars, stats, cluster)
    }

    fn star_table(stars: &[StellarSystem], stats: &ChainStats, cluster: &Cluster) -> String {
        let mut out = Vec::new();
        write_star_table(
            &mut out,
            stars,
            stats,
            cluster,
            &TurnbackModel,
            &filters(),
            IfmrModel::Williams,
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_star_table_layout() {
        let (stars, stats, cluster) = fixture();
        let text = star_table(&stars, &stats, &cluster);
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("     Star"));
        assert!(header.contains("meanmass1"));
        assert!(header.contains("meanWDMass1"));
        assert!(header.contains("meanB"));
        assert!(header.contains("varV"));

        let row = lines.next().unwrap();
        assert!(row.trim_start().starts_with("s1"));
        assert!(row.contains("1.20000")); // mean mass
        assert!(row.contains("0.7500")); // membership probability 3/4
    }

    #[test]
    fn test_never_member_star_renders_sentinels() {
        let (stars, stats, cluster) = fixture();
        let text = star_table(&stars, &stats, &cluster);
        let row = text.lines().nth(2).unwrap();
        assert!(row.trim_start().starts_with("s2"));
        assert!(row.contains("0.0000")); // membership probability
        assert!(row.contains("99.999"));
    }

    #[test]
    fn test_wd_columns_only_for_white_dwarfs() {
        let (mut stars, stats, cluster) = fixture();
        // mean mass 1.2 is below the 2.0 turnoff: no WD columns
        let text = star_table(&stars, &stats, &cluster);
        assert!(!text.contains(&format!("{:10.5}", 0.339 + 0.129 * 1.2)));

        // a sampled mass above the turnoff classifies the star as WD
        stars[0].primary.mass = 2.5;
        let mut cluster = cluster;
        cluster.set_m_wd_up(8.0);
        let text = star_table(&stars, &stats, &cluster);
        assert!(text.contains(&format!("{:10.5}", 0.339 + 0.129 * 1.2)));
    }

    #[test]
    fn test_param_table_round_trip() {
        let (_, mut stats, _) = fixture();
        for x in [9.0, 9.2, 9.4] {
            stats.params[0].update(x);
        }
        let render = |stats: &ChainStats| {
            let mut out = Vec::new();
            write_param_table(&mut out, stats).unwrap();
            String::from_utf8(out).unwrap()
        };
        let first = render(&stats);
        let second = render(&stats);
        assert_eq!(first, second);
        assert!(first.starts_with("Parameter     mean"));
        assert!(first.contains("logAge"));
        assert!(first.contains("absorption"));
        assert_eq!(first.lines().count(), 6);
    }

    #[test]
    fn test_debug_track_monotonic_filter() {
        let (_, _, cluster) = fixture();
        let mut out = Vec::new();
        write_debug_track(&mut out, &cluster, &TurnbackModel, &filters()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with(" mass stage1"));
        // masses 0.01..=1.00 descend in magnitude and are kept; every point
        // past the 1.0 turn-back is dropped
        assert_eq!(lines.len(), 1 + 100);
        assert!(lines[1].trim_start().starts_with("0.01"));
        assert!(lines.last().unwrap().trim_start().starts_with("1.00"));
    }

    #[test]
    fn test_star_table_round_trip() {
        let (stars, stats, cluster) = fixture();
        assert_eq!(
            star_table(&stars, &stats, &cluster),
            star_table(&stars, &stats, &cluster)
        );
    }
}

use crate::data::cluster::{Cluster, EPS};
use crate::data::filters::FilterSet;
use crate::data::star::StellarSystem;
use crate::models::grid::StellarModel;

/// Magnitude sentinel for an unphysical or undetectable system.
///
/// A combined magnitude of 90 or more in the reference filter is a valid
/// result, not an error; callers check against this threshold.
pub const UNDETECTABLE_MAG: f64 = 99.999;

fn to_flux(mag: f64) -> f64 {
    10f64.powf(-0.4 * mag)
}

fn to_mag(flux: f64) -> f64 {
    -2.5 * flux.log10()
}

/// Synthesizes the combined apparent magnitude of a (possibly binary) system
/// in every active filter.
///
/// Each component with nonzero mass is resolved against the model grid at the
/// cluster's age and composition, shifted by the distance modulus and the
/// per-filter absorption, and folded in flux space; a component that is
/// off-grid contributes no measurable flux. Pure function of its inputs.
pub fn combined_mags(
    system: &StellarSystem,
    cluster: &Cluster,
    model: &dyn StellarModel,
    filters: &FilterSet,
) -> Vec<f64> {
    let mut total_flux = vec![0.0; filters.len()];
    let mut detected = false;

    for component in [&system.primary, &system.secondary] {
        if component.mass <= EPS {
            continue;
        }
        match model.lookup(
            cluster.log_age(),
            cluster.feh(),
            cluster.helium(),
            component.mass,
        ) {
            Ok(absolute) => {
                for (i, slot) in filters.slots().enumerate() {
                    let apparent = absolute[slot]
                        + cluster.modulus()
                        + cluster.absorption() * filters.absorption_ratio(i);
                    total_flux[i] += to_flux(apparent);
                }
                detected = true;
            }
            Err(err) => {
                log::debug!(
                    "component mass {:.4} off-grid, treated as undetectable: {}",
                    component.mass,
                    err
                );
            }
        }
    }

    if !detected {
        return vec![UNDETECTABLE_MAG; filters.len()];
    }
    total_flux.into_iter().map(to_mag).collect()
}

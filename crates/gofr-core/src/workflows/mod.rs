//! # Workflows Module
//!
//! Complete analyses assembled from the [`crate::core`] models and the
//! [`crate::engine`] lifecycle.
//!
//! - [`rdf`]: radial distribution function g(r) between atoms or explicit
//!   atom pairs, averaged over a trajectory.
//! - [`angles`]: distribution of bond angles or dihedral angles between
//!   matched atom triplets or quadruplets.

pub mod angles;
mod output;
pub mod rdf;

use crate::core::io::trajectory::Trajectory;
use crate::engine::config::TrajectoryOptions;
use crate::engine::error::EngineError;

/// Opens the trajectory and applies the cell and topology overrides.
fn open_trajectory(options: &TrajectoryOptions) -> Result<Trajectory, EngineError> {
    let mut source = Trajectory::open(&options.path, options.format)?;
    if let Some(cell) = &options.cell {
        source.set_cell(cell.clone());
    }
    if let Some(topology) = &options.topology {
        source.set_topology(topology, options.format)?;
    }
    Ok(source)
}

//! # lightshot
//!
//! A CPU photon tracer that bakes static, multi-bounce lighting onto procedurally generated
//! voxel terrain.
//!
//! ## Pipeline
//!
//! ```text
//!   Scene ─▶ Heightfield ─▶ Plates ─▶ sample grids ─▶ photon passes ─▶ 8-bit colors
//! ```
//!
//! - [`heightfield`]: one random integer depth per grid cell.
//! - [`plates`]: a top quad per cell plus vertical connector quads across depth steps.
//! - [`sampling`]: the world position of every `resolution × resolution` sample of each plate.
//! - [`solver`]: wavefronts of photons pushed against every sample, with exact
//!   segment/triangle occlusion, re-emitting a share of the received energy each pass.
//! - [`lightmap`]: receiver energy clamped and quantized into per-plate textures.
//!
//! Every stage that touches plates in bulk fans out over [`rayon`]'s pool, one task per plate.
//! Randomness comes from two explicitly seeded generators, so a [`Scene`] always bakes to the
//! same bytes.

pub mod error;
pub mod heightfield;
pub mod lightmap;
pub mod math;
pub mod mesh;
pub mod occlusion;
pub mod plates;
pub mod presets;
pub mod preview;
pub mod sampling;
pub mod scene;
pub mod solver;

use heightfield::Heightfield;
use occlusion::OcclusionStrategy;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use scene::Plate;
use solver::{BakeStats, PassObserver, PhotonSolver};

pub use error::{ExportError, SceneError};
pub use scene::Scene;

/// A finished bake.
#[derive(Debug, Clone)]
pub struct Bake {
    pub heightfield: Heightfield,
    /// Plates with receivers and 8-bit colors filled in.
    pub plates: Vec<Plate>,
    pub stats: BakeStats,
}

/// Generates the terrain and its plates, without lighting buffers.
pub fn generate_plates(scene: &Scene) -> (Heightfield, Vec<Plate>) {
    let mut depth_rng = Xoshiro256PlusPlus::seed_from_u64(scene.depth_seed);
    let mut tint_rng = Xoshiro256PlusPlus::seed_from_u64(scene.tint_seed);
    let heightfield = Heightfield::generate(scene, &mut depth_rng);
    let plates = plates::build_plates(scene, &heightfield, &mut tint_rng);
    (heightfield, plates)
}

/// Runs the whole pipeline for `scene`.
pub fn bake(
    scene: &Scene,
    occlusion: OcclusionStrategy,
    observer: &dyn PassObserver,
) -> Result<Bake, SceneError> {
    scene.validate()?;

    let (heightfield, mut plates) = generate_plates(scene);
    log::info!(
        "{} plates, resolution {}x{}, retransmission {}%",
        plates.len(),
        scene.resolution,
        scene.resolution,
        (scene.retransmission * 100.0) as u32
    );

    sampling::prepare_plates(scene, &mut plates);
    let occluder = occlusion.build(&plates);
    let stats = PhotonSolver::new(scene, occluder.as_ref()).run(&mut plates, observer);
    lightmap::convert(&mut plates);

    Ok(Bake {
        heightfield,
        plates,
        stats,
    })
}

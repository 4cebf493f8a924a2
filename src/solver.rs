//! Iterative photon transport.
//!
//! A wavefront of photons is pushed against every sample of every plate. Each sample adds what
//! it receives to its permanent receiver, and a `retransmission` share of it to its emitter.
//! After every plate has been visited, the emitters become the next wavefront. This repeats
//! until nothing is re-emitted or the pass budget runs out.
//!
//! Within a pass, each plate is an independent task: it mutates only its own buffers and reads
//! the shared wavefront and the occluder's geometry snapshot. Passes are separated by a barrier
//! because the next wavefront depends on every plate's emitters.

use crate::math::*;
use crate::occlusion::Occluder;
use crate::scene::{Photon, Plate, Scene, EMISSION_OFFSET, ENERGY_SCALE, LIGHT_ENERGY};
use rayon::prelude::*;
use std::time::{Duration, Instant};

// ─── Observer ───────────────────────────────────────────────────────────────

/// Progress hooks called by the solver.
///
/// `plate_finished` is called concurrently from worker threads, in no particular order.
/// Implementations must not influence the bake; they exist for diagnostics only.
pub trait PassObserver: Sync {
    fn pass_started(&self, _pass: u32, _max_passes: u32, _photons: usize, _plates: usize) {}

    fn plate_finished(&self) {}

    fn pass_finished(&self, _pass: u32, _emitted: usize) {}
}

impl PassObserver for () {}

// ─── State ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A pass re-emitted no photon above the energy threshold.
    Converged,
    /// The pass budget was used up with photons still in flight.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// No wavefront yet; the next step seeds it from the light sources.
    Seeding,
    /// `completed` passes have run and a non-empty wavefront is waiting.
    Propagating { completed: u32 },
    Finished(Termination),
}

/// What happened during a bake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BakeStats {
    pub passes: u32,
    /// Wavefront size at the start of each pass.
    pub photons_per_pass: Vec<usize>,
    /// Sample/photon pairs skipped because they coincide.
    pub degenerate_pairs: u64,
    pub termination: Option<Termination>,
    pub elapsed: Duration,
}

impl BakeStats {
    pub fn total_photons(&self) -> usize {
        self.photons_per_pass.iter().sum()
    }
}

// ─── Transfer ───────────────────────────────────────────────────────────────

/// Attenuation for light that travelled `distance`: white up close, blending linearly to the
/// scene's decay floor at `decay_distance` and beyond.
#[inline]
pub fn wavelength_decay(distance: f64, scene: &Scene) -> Color {
    let closeness = 1.0 - (distance / scene.decay_distance).min(1.0);
    scene.wavelength_decay + (Color::ones() - scene.wavelength_decay) * closeness
}

/// Energy a sample with material `tint` receives from `photon`.
///
/// `direction` is the unit vector from the sample to the photon. The cosine term is not
/// clamped: a photon whose normal points away from the sample contributes negative energy.
#[inline]
pub fn received_energy(
    photon: &Photon,
    direction: Vec3,
    distance: f64,
    tint: Color,
    scene: &Scene,
) -> Color {
    let cosine = -photon.normal.dot(direction);
    photon
        .color
        .hadamard(tint)
        .hadamard(wavelength_decay(distance, scene))
        * cosine
}

// ─── Wavefronts ─────────────────────────────────────────────────────────────

/// First wavefront: for every light, one photon per sample of a virtual plate one cell wide
/// centred on the light.
///
/// Each light injects [`LIGHT_ENERGY`] of its color spread over the pass budget. Colors are
/// inflated by [`ENERGY_SCALE`] and divided by the sample count so the total energy does not
/// depend on the resolution.
pub fn seed_wavefront(scene: &Scene) -> Vec<Photon> {
    let res = f64::from(scene.resolution);
    let pw = scene.plate_width;
    let half = pw / 2.0;
    let per_pass = LIGHT_ENERGY / f64::from(scene.max_passes.max(1));
    let scale = per_pass * ENERGY_SCALE * scene.sample_weight();

    let mut photons = Vec::with_capacity(scene.lights.len() * scene.samples_per_plate());
    for light in &scene.lights {
        let origin = light.position * pw;
        let color = light.color * scale;
        for y in 0..scene.resolution {
            let shift_y = f64::from(y) * pw / res - half;
            for x in 0..scene.resolution {
                let shift_x = f64::from(x) * pw / res - half;
                photons.push(Photon {
                    position: origin + Vec3::new(shift_x, shift_y, 0.0),
                    normal: light.normal,
                    color,
                });
            }
        }
    }
    photons
}

/// Collects the next wavefront from every plate's emitters, resetting them.
///
/// A sample emits only if all three channels of its weighted energy exceed [`EPSILON`]; the
/// photon starts a hair above the plate along its normal.
pub fn emit_wavefront(plates: &mut [Plate], scene: &Scene) -> Vec<Photon> {
    let weight = scene.sample_weight();
    let mut photons = Vec::new();
    for plate in plates.iter_mut() {
        let normal = plate.normal;
        for emitter in &mut plate.emitters {
            let color = emitter.energy * weight;
            if color.all_greater_than(EPSILON) {
                photons.push(Photon {
                    position: emitter.position + normal * EMISSION_OFFSET,
                    normal,
                    color,
                });
            }
            emitter.energy = Color::zero();
        }
    }
    photons
}

/// Accumulates one wavefront into plate `index`. Returns the number of degenerate pairs.
fn illuminate_plate(
    index: usize,
    plate: &mut Plate,
    wavefront: &[Photon],
    occluder: &dyn Occluder,
    scene: &Scene,
) -> u64 {
    let tint = plate.material.color;
    let retransmission = plate.material.retransmission;
    let mut degenerate = 0;

    for photon in wavefront {
        for (receiver, emitter) in plate.receivers.iter_mut().zip(plate.emitters.iter_mut()) {
            let sample = emitter.position;
            let offset = photon.position - sample;
            let Some(direction) = offset.try_normalized() else {
                degenerate += 1;
                continue;
            };
            if !direction.facing(photon.normal) {
                continue;
            }
            if occluder.blocked(sample, photon.position, index) {
                continue;
            }

            let received = received_energy(photon, direction, offset.length(), tint, scene);
            *receiver += received;
            emitter.energy += received * retransmission;
        }
    }
    degenerate
}

// ─── Solver ─────────────────────────────────────────────────────────────────

/// Drives the seeding → propagating → finished state machine over a plate list.
///
/// Plates must already be prepared by [`crate::sampling::prepare_plates`], and `occluder`
/// must have been built from the same plate list.
pub struct PhotonSolver<'a> {
    scene: &'a Scene,
    occluder: &'a dyn Occluder,
    wavefront: Vec<Photon>,
    state: SolverState,
    stats: BakeStats,
}

impl<'a> PhotonSolver<'a> {
    pub fn new(scene: &'a Scene, occluder: &'a dyn Occluder) -> Self {
        Self {
            scene,
            occluder,
            wavefront: Vec::new(),
            state: SolverState::Seeding,
            stats: BakeStats::default(),
        }
    }

    /// Starts from a given wavefront instead of the scene's lights.
    pub fn with_wavefront(
        scene: &'a Scene,
        occluder: &'a dyn Occluder,
        wavefront: Vec<Photon>,
    ) -> Self {
        let mut solver = Self::new(scene, occluder);
        solver.wavefront = wavefront;
        solver.state = solver.check_termination(0);
        solver
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn wavefront(&self) -> &[Photon] {
        &self.wavefront
    }

    pub fn stats(&self) -> &BakeStats {
        &self.stats
    }

    fn check_termination(&mut self, completed: u32) -> SolverState {
        let termination = if self.wavefront.is_empty() {
            Termination::Converged
        } else if completed >= self.scene.max_passes {
            Termination::Exhausted
        } else {
            return SolverState::Propagating { completed };
        };
        self.stats.termination = Some(termination);
        SolverState::Finished(termination)
    }

    /// Advances by one pass (seeding first if needed) and returns the new state.
    ///
    /// Does nothing once finished.
    pub fn step(&mut self, plates: &mut [Plate], observer: &dyn PassObserver) -> SolverState {
        if self.state == SolverState::Seeding {
            self.wavefront = seed_wavefront(self.scene);
            log::debug!("seeded {} photon(s)", self.wavefront.len());
            self.state = self.check_termination(0);
        }
        let SolverState::Propagating { completed } = self.state else {
            return self.state;
        };
        debug_assert_eq!(plates.len(), self.occluder.plate_count());

        let pass = completed + 1;
        let max_passes = self.scene.max_passes;
        log::info!("pass {pass}/{max_passes} - {} photon(s)", self.wavefront.len());
        observer.pass_started(pass, max_passes, self.wavefront.len(), plates.len());
        self.stats.photons_per_pass.push(self.wavefront.len());

        let wavefront = &self.wavefront;
        let occluder = self.occluder;
        let scene = self.scene;
        let degenerate: u64 = plates
            .par_iter_mut()
            .enumerate()
            .map(|(index, plate)| {
                let skipped = illuminate_plate(index, plate, wavefront, occluder, scene);
                observer.plate_finished();
                skipped
            })
            .sum();
        if degenerate > 0 {
            log::warn!("pass {pass}: skipped {degenerate} sample(s) coinciding with a photon");
        }
        self.stats.degenerate_pairs += degenerate;

        self.wavefront = emit_wavefront(plates, scene);
        self.stats.passes = pass;
        log::debug!("pass {pass} re-emitted {} photon(s)", self.wavefront.len());
        observer.pass_finished(pass, self.wavefront.len());

        self.state = self.check_termination(pass);
        self.state
    }

    /// Steps until finished and returns the statistics.
    pub fn run(mut self, plates: &mut [Plate], observer: &dyn PassObserver) -> BakeStats {
        let t0 = Instant::now();
        while !matches!(self.step(plates, observer), SolverState::Finished(_)) {}
        self.stats.elapsed = t0.elapsed();
        log::info!(
            "{:?} after {} pass(es) in {:.2?}",
            self.stats.termination.unwrap_or(Termination::Converged),
            self.stats.passes,
            self.stats.elapsed
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occlusion::{BruteForce, OcclusionStrategy};
    use crate::sampling::prepare_plates;
    use crate::scene::{Material, PlateKind};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn square_at_z(z: f64, retransmission: f64) -> Plate {
        Plate::new(
            PlateKind::Top { row: 0, col: 0 },
            [
                Point3::new(0.0, 0.0, z),
                Point3::new(1.0, 0.0, z),
                Point3::new(1.0, 1.0, z),
                Point3::new(0.0, 1.0, z),
            ],
            Vec3::new(0.0, 0.0, -1.0),
            Material {
                color: Color::ones(),
                retransmission,
            },
        )
    }

    fn one_sample_scene() -> Scene {
        Scene {
            resolution: 1,
            ..Scene::default()
        }
    }

    fn photon_below(z: f64) -> Photon {
        Photon {
            position: Point3::new(0.5, 0.5, z),
            normal: Vec3::new(0.0, 0.0, 1.0),
            color: Color::new(10.0, 20.0, 30.0),
        }
    }

    #[test]
    fn decay_blends_from_white_to_floor() {
        let scene = Scene::default();
        assert_eq!(wavelength_decay(0.0, &scene), Color::ones());
        assert_eq!(wavelength_decay(10.0, &scene), scene.wavelength_decay);
        assert_eq!(wavelength_decay(250.0, &scene), scene.wavelength_decay);
        let half = wavelength_decay(5.0, &scene);
        assert!((half.x - 0.9).abs() < 1e-12);
        assert!((half.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn back_facing_photon_contributes_negative_energy() {
        let scene = Scene::default();
        let photon = photon_below(-1.0);
        // Sample direction pointing along the photon normal instead of against it.
        let energy = received_energy(&photon, Vec3::new(0.0, 0.0, 1.0), 1.0, Color::ones(), &scene);
        assert!(energy.x < 0.0 && energy.y < 0.0 && energy.z < 0.0);
    }

    #[test]
    fn seeding_preserves_total_energy_across_resolutions() {
        for resolution in [1, 2, 4, 8] {
            let scene = Scene {
                resolution,
                ..Scene::default()
            };
            let photons = seed_wavefront(&scene);
            assert_eq!(photons.len(), (resolution * resolution) as usize);
            let total = photons.iter().fold(Color::zero(), |acc, p| acc + p.color);
            let expected = scene.lights[0].color * (LIGHT_ENERGY / 4.0 * ENERGY_SCALE);
            assert!((total - expected).length() < 1e-9, "{total} != {expected}");
        }
    }

    #[test]
    fn seeding_spreads_light_over_the_pass_budget() {
        let seeded_energy = |max_passes| {
            let scene = Scene {
                max_passes,
                ..Scene::default()
            };
            seed_wavefront(&scene)
                .iter()
                .fold(Color::zero(), |acc, p| acc + p.color)
        };
        let four = seeded_energy(4);
        let two = seeded_energy(2);
        assert!((two - four * 2.0).length() < 1e-9, "{two} != 2 * {four}");
        assert!((seeded_energy(1) - four * 4.0).length() < 1e-9);
    }

    #[test]
    fn seeded_photons_cover_one_cell_around_light() {
        let scene = Scene {
            resolution: 2,
            ..Scene::default()
        };
        let light = scene.lights[0].position;
        let photons = seed_wavefront(&scene);
        assert_eq!(photons[0].position, light + Vec3::new(-0.5, -0.5, 0.0));
        assert_eq!(photons[3].position, light + Vec3::new(0.0, 0.0, 0.0));
        assert!(photons.iter().all(|p| p.normal == Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn unblocked_sample_receives_direct_light() {
        let scene = one_sample_scene();
        let mut plates = vec![square_at_z(0.0, 0.5)];
        prepare_plates(&scene, &mut plates);
        let occluder = BruteForce::new(&plates);
        let photon = photon_below(-2.0);

        let mut solver = PhotonSolver::with_wavefront(&scene, &occluder, vec![photon]);
        solver.step(&mut plates, &());

        let expected =
            received_energy(&photon, Vec3::new(0.0, 0.0, -1.0), 2.0, Color::ones(), &scene);
        assert_eq!(plates[0].receivers[0], expected);
        // Half is re-emitted, weighted by the single sample, one step off the plate.
        assert_eq!(solver.wavefront().len(), 1);
        assert_eq!(solver.wavefront()[0].color, expected * 0.5);
        assert_eq!(
            solver.wavefront()[0].position,
            Point3::new(0.5, 0.5, -EMISSION_OFFSET)
        );
    }

    #[test]
    fn occluded_sample_receives_nothing() {
        let scene = one_sample_scene();
        let mut plates = vec![square_at_z(0.0, 0.5), square_at_z(-1.0, 0.5)];
        prepare_plates(&scene, &mut plates);
        let occluder = BruteForce::new(&plates);

        let mut solver = PhotonSolver::with_wavefront(&scene, &occluder, vec![photon_below(-2.0)]);
        solver.step(&mut plates, &());

        assert_eq!(plates[0].receivers[0], Color::zero());
        assert!(plates[1].receivers[0].all_greater_than(0.0));
    }

    #[test]
    fn photon_behind_its_normal_is_ignored() {
        let scene = one_sample_scene();
        let mut plates = vec![square_at_z(0.0, 0.5)];
        prepare_plates(&scene, &mut plates);
        let occluder = BruteForce::new(&plates);
        // Photon on the far side, shining away from the plate.
        let photon = Photon {
            normal: Vec3::new(0.0, 0.0, 1.0),
            ..photon_below(2.0)
        };

        let mut solver = PhotonSolver::with_wavefront(&scene, &occluder, vec![photon]);
        let state = solver.step(&mut plates, &());
        assert_eq!(plates[0].receivers[0], Color::zero());
        assert_eq!(state, SolverState::Finished(Termination::Converged));
    }

    #[test]
    fn coinciding_photon_is_skipped_and_counted() {
        let scene = one_sample_scene();
        let mut plates = vec![square_at_z(0.0, 0.5)];
        prepare_plates(&scene, &mut plates);
        let occluder = BruteForce::new(&plates);
        let photon = Photon {
            position: Point3::new(0.5, 0.5, 0.0),
            ..photon_below(0.0)
        };

        let stats = PhotonSolver::with_wavefront(&scene, &occluder, vec![photon]).run(&mut plates, &());
        assert_eq!(stats.degenerate_pairs, 1);
        assert!(plates[0].receivers[0].x.is_finite());
        assert_eq!(plates[0].receivers[0], Color::zero());
    }

    #[test]
    fn empty_wavefront_finishes_immediately() {
        let scene = one_sample_scene();
        let plates = vec![square_at_z(0.0, 0.5)];
        let occluder = BruteForce::new(&plates);
        let solver = PhotonSolver::with_wavefront(&scene, &occluder, Vec::new());
        assert_eq!(solver.state(), SolverState::Finished(Termination::Converged));
    }

    #[test]
    fn pass_budget_bounds_the_bake() {
        // Two facing mirrors bounce light forever; only the budget stops them.
        let scene = Scene {
            resolution: 2,
            retransmission: 1.0,
            max_passes: 3,
            ..Scene::default()
        };
        let mut lower = square_at_z(0.0, 1.0);
        lower.normal = Vec3::new(0.0, 0.0, 1.0);
        let upper = square_at_z(1.0, 1.0);
        let mut plates = vec![lower, upper];
        prepare_plates(&scene, &mut plates);
        let occluder = BruteForce::new(&plates);
        let light = Photon {
            position: Point3::new(0.5, 0.5, 0.5),
            normal: Vec3::new(0.0, 0.0, -1.0),
            color: Color::ones(),
        };

        let mut solver = PhotonSolver::with_wavefront(&scene, &occluder, vec![light]);
        let mut states = Vec::new();
        loop {
            let state = solver.step(&mut plates, &());
            states.push(state);
            if let SolverState::Finished(_) = state {
                break;
            }
        }
        assert_eq!(
            states,
            vec![
                SolverState::Propagating { completed: 1 },
                SolverState::Propagating { completed: 2 },
                SolverState::Finished(Termination::Exhausted),
            ]
        );
        assert_eq!(solver.stats().passes, 3);
        assert_eq!(solver.step(&mut plates, &()), SolverState::Finished(Termination::Exhausted));
        assert_eq!(solver.stats().passes, 3);
    }

    #[test]
    fn observer_sees_every_plate_every_pass() {
        #[derive(Default)]
        struct Counter {
            plates: AtomicUsize,
            passes: AtomicUsize,
        }
        impl PassObserver for Counter {
            fn plate_finished(&self) {
                self.plates.fetch_add(1, Ordering::Relaxed);
            }
            fn pass_finished(&self, _pass: u32, _emitted: usize) {
                self.passes.fetch_add(1, Ordering::Relaxed);
            }
        }

        let scene = Scene {
            resolution: 2,
            ..Scene::default()
        };
        let mut plates = vec![square_at_z(0.0, 0.5), square_at_z(-1.0, 0.5)];
        prepare_plates(&scene, &mut plates);
        let occluder = OcclusionStrategy::BruteForce.build(&plates);
        let counter = Counter::default();
        let stats = PhotonSolver::new(&scene, occluder.as_ref()).run(&mut plates, &counter);

        assert!(stats.passes >= 1 && stats.passes <= scene.max_passes);
        assert_eq!(counter.passes.load(Ordering::Relaxed), stats.passes as usize);
        assert_eq!(
            counter.plates.load(Ordering::Relaxed),
            plates.len() * stats.passes as usize
        );
        assert_eq!(stats.photons_per_pass.len(), stats.passes as usize);
        assert_eq!(stats.photons_per_pass[0], 4);
    }
}

use crate::error::SceneError;
use crate::math::*;

/// Receiver and emitter energy is carried at this multiple of the displayable [0, 1] range
/// so that many small per-photon contributions keep their precision.
pub const ENERGY_SCALE: f64 = 1000.0;

/// Fraction of a light source's color injected by the whole bake. Seeding divides it by the
/// scene's pass budget.
pub const LIGHT_ENERGY: f64 = 0.2;

/// Largest accepted `max_depth`; the widest depth gap, `2 * max_depth`, must fit in an `i32`.
pub const MAX_DEPTH_LIMIT: u32 = (i32::MAX / 2) as u32;

/// Distance a re-emitted photon is pushed off its plate along the plate normal.
pub const EMISSION_OFFSET: f64 = 1e-7;

/// Immutable bake configuration.
///
/// Every piece of generated geometry derives from these values alone, including the two
/// generator seeds, so equal scenes bake to identical lightmaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Grid cells along X.
    pub width: u32,
    /// Grid cells along Y.
    pub height: u32,
    /// Largest depth offset, in cells, a perturbed cell may take (both signs).
    pub max_depth: u32,
    /// Percent chance that a cell's depth is randomized.
    pub depth_rate: u32,
    /// Percent chance that a connector plate gets a colored tint instead of white.
    pub color_rate: u32,
    /// Edge length of one cell in world units.
    pub plate_width: f64,
    /// Samples per plate side. The CLI only passes powers of two, but any value >= 1 works.
    pub resolution: u32,
    /// Fraction of received energy a plate re-emits on the next pass.
    pub retransmission: f64,
    /// Distance at which light is fully shifted to `wavelength_decay`.
    pub decay_distance: f64,
    /// Per-channel attenuation floor reached at `decay_distance`.
    pub wavelength_decay: Color,
    /// Upper bound on propagation passes.
    pub max_passes: u32,
    pub depth_seed: u64,
    pub tint_seed: u64,
    pub lights: Vec<LightSource>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 7,
            height: 7,
            max_depth: 2,
            depth_rate: 25,
            color_rate: 30,
            plate_width: 1.0,
            resolution: 16,
            retransmission: 0.5,
            decay_distance: 10.0,
            wavelength_decay: Color::new(0.8, 0.9, 1.0),
            max_passes: 4,
            depth_seed: 4,
            tint_seed: 20,
            lights: vec![LightSource::sun()],
        }
    }
}

impl Scene {
    /// Checks the invariants the baking stages rely on.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.resolution == 0 {
            return Err(SceneError::ZeroResolution);
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(SceneError::MaxDepth {
                depth: self.max_depth,
                limit: MAX_DEPTH_LIMIT,
            });
        }
        if !(self.plate_width > 0.0 && self.plate_width.is_finite()) {
            return Err(SceneError::PlateWidth(self.plate_width));
        }
        if !(0.0..=1.0).contains(&self.retransmission) {
            return Err(SceneError::Retransmission(self.retransmission));
        }
        if !(self.decay_distance > 0.0 && self.decay_distance.is_finite()) {
            return Err(SceneError::DecayDistance(self.decay_distance));
        }
        for (name, rate) in [("depth", self.depth_rate), ("color", self.color_rate)] {
            if rate > 100 {
                return Err(SceneError::Rate { name, rate });
            }
        }
        if self.max_passes == 0 {
            return Err(SceneError::ZeroPasses);
        }
        if self.lights.is_empty() {
            return Err(SceneError::NoLights);
        }
        Ok(())
    }

    /// Number of samples on each plate.
    #[inline]
    pub fn samples_per_plate(&self) -> usize {
        let side = self.resolution as usize;
        side * side
    }

    /// Weight of a single sample, `1 / resolution²`, keeping total energy independent of
    /// the sampling resolution.
    #[inline]
    pub fn sample_weight(&self) -> f64 {
        1.0 / self.samples_per_plate() as f64
    }
}

/// A fixed light used to seed the first photon wavefront.
///
/// `position` is given in cell units and scaled by the plate width when seeding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: Point3,
    pub normal: Vec3,
    pub color: Color,
}

impl LightSource {
    /// The reference light: slightly warm, hovering off one side of the terrain and shining
    /// along +Z onto the downward-facing tops.
    pub fn sun() -> Self {
        Self {
            position: Point3::new(1.01, 3.23, -2.34),
            normal: Vec3::new(0.0, 0.0, 1.0),
            color: Color::new(1.0, 0.95, 0.9),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Tint applied to all received energy.
    pub color: Color,
    /// Fraction of received energy fed into the next wavefront, in [0, 1].
    pub retransmission: f64,
}

/// A directed packet of energy, alive for one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub position: Point3,
    pub normal: Vec3,
    pub color: Color,
}

/// A sample's fixed world position and the energy it will re-emit next pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Emitter {
    pub position: Point3,
    pub energy: Color,
}

/// Which grid direction a connector bridges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Between a cell and its right neighbour; normal along ±X.
    Column,
    /// Between a cell and the neighbour below; normal along ±Y.
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlateKind {
    /// Horizontal face of cell `(row, col)`.
    Top { row: u32, col: u32 },
    /// Vertical face one depth step tall, on the positive-side edge of cell `(row, col)`.
    Connector {
        row: u32,
        col: u32,
        axis: Axis,
        from_depth: i32,
        to_depth: i32,
    },
}

/// A planar quad of the terrain mesh together with its lightmap buffers.
///
/// `receivers` and `emitters` each hold `resolution²` entries once the plate has been prepared
/// by [`crate::sampling::prepare_plates`]; `colors` is filled by [`crate::lightmap::convert`].
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    pub kind: PlateKind,
    pub corners: [Point3; 4],
    pub tex_coords: [TexCoord; 4],
    pub normal: Vec3,
    pub material: Material,
    pub emitters: Vec<Emitter>,
    pub receivers: Vec<Color>,
    pub colors: Vec<[u8; 3]>,
}

impl Plate {
    /// Unit-square layout shared by every plate.
    pub const TEX_COORDS: [TexCoord; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    pub fn new(kind: PlateKind, corners: [Point3; 4], normal: Vec3, material: Material) -> Self {
        Self {
            kind,
            corners,
            tex_coords: Self::TEX_COORDS,
            normal,
            material,
            emitters: Vec::new(),
            receivers: Vec::new(),
            colors: Vec::new(),
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self.kind, PlateKind::Top { .. })
    }
}

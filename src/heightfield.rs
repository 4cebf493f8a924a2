//! Random terrain relief: one integer depth per grid cell.

use crate::scene::Scene;
use rand::Rng;

/// Row-major grid of cell depths, `height` rows of `width` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightfield {
    width: u32,
    height: u32,
    depths: Vec<i32>,
}

impl Heightfield {
    /// Builds a heightfield from explicit rows. Returns `None` if the rows are ragged or empty.
    pub fn from_rows(rows: &[&[i32]]) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width: u32::try_from(width).ok()?,
            height: u32::try_from(rows.len()).ok()?,
            depths: rows.concat(),
        })
    }

    /// A heightfield with every cell at depth 0.
    pub fn flat(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depths: vec![0; width as usize * height as usize],
        }
    }

    /// Draws the relief for `scene`.
    ///
    /// Each cell rolls a trigger in `[0, 100]`; a roll of at least `100 - depth_rate` picks a
    /// depth uniformly in `[-max_depth, max_depth]`, anything lower leaves the cell at 0.
    pub fn generate<R: Rng + ?Sized>(scene: &Scene, rng: &mut R) -> Self {
        let max_depth = i32::try_from(scene.max_depth).unwrap_or(i32::MAX);
        let threshold = 100 - scene.depth_rate.min(100) as i32;
        let cells = scene.width as usize * scene.height as usize;

        let mut depths = Vec::with_capacity(cells);
        for _ in 0..cells {
            let trigger: i32 = rng.gen_range(0..=100);
            depths.push(if trigger >= threshold {
                rng.gen_range(-max_depth..=max_depth)
            } else {
                0
            });
        }

        let field = Self {
            width: scene.width,
            height: scene.height,
            depths,
        };
        log::debug!(
            "heightfield {}x{}: {} raised/sunk cells",
            field.width,
            field.height,
            field.depths.iter().filter(|&&d| d != 0).count()
        );
        field
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn depth(&self, row: u32, col: u32) -> i32 {
        self.depths[row as usize * self.width as usize + col as usize]
    }

    pub fn depths(&self) -> &[i32] {
        &self.depths
    }

    /// True when every cell sits at the same depth.
    pub fn is_level(&self) -> bool {
        self.depths.windows(2).all(|w| w[0] == w[1])
    }
}

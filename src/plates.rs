//! Turns a heightfield into the list of plates: one top face per cell plus a stack of
//! vertical connectors wherever neighbouring cells sit at different depths.

use crate::heightfield::Heightfield;
use crate::math::*;
use crate::scene::{Axis, Material, Plate, PlateKind, Scene};
use rand::Rng;

/// Normal shared by every top plate. The relief extends along Z and light reaches the tops
/// from negative Z.
pub const TOP_NORMAL: Vec3 = Vec3::new(0.0, 0.0, -1.0);

pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
pub const REDDISH: Color = Color::new(1.0, 0.5, 0.5);
pub const GREENISH: Color = Color::new(0.5, 1.0, 0.5);
pub const BLUISH: Color = Color::new(0.5, 0.5, 1.0);

/// Picks the tint of one connector plate.
///
/// White with probability `100 - color_rate` percent; otherwise a second roll in `[0, 100]`
/// selects reddish (`> 66`), greenish (`> 33`) or bluish.
pub fn connector_tint<R: Rng + ?Sized>(rng: &mut R, color_rate: u32) -> Color {
    let white_below = 100 - color_rate.min(100) as i32;
    if rng.gen_range(0..=100) < white_below {
        return WHITE;
    }
    match rng.gen_range(0..=100) {
        67.. => REDDISH,
        34..=66 => GREENISH,
        _ => BLUISH,
    }
}

/// Consecutive depth pairs walked from `from` to `to`, one step at a time.
///
/// Empty when the depths are equal. The gap must fit in an `i32`, which
/// [`Scene::validate`] guarantees by bounding `max_depth`.
pub fn depth_steps(from: i32, to: i32) -> impl Iterator<Item = (i32, i32)> {
    let step = if to > from { 1 } else { -1 };
    let count = from.abs_diff(to);
    (0..count as i32).map(move |i| {
        let d = from + i * step;
        (d, d + step)
    })
}

/// Builds the complete plate list for `heightfield`.
///
/// Cells are visited row by row; each cell emits its top plate, then the connectors towards
/// its right neighbour, then those towards the neighbour below. Connector tints are drawn
/// from `tint_rng` in that same order.
pub fn build_plates<R: Rng + ?Sized>(
    scene: &Scene,
    heightfield: &Heightfield,
    tint_rng: &mut R,
) -> Vec<Plate> {
    let pw = scene.plate_width;
    let width = heightfield.width();
    let height = heightfield.height();
    let half_width = f64::from(width) * pw * 0.5;
    let half_height = f64::from(height) * pw * 0.5;
    let base = Material {
        color: WHITE,
        retransmission: scene.retransmission,
    };

    let mut plates = Vec::new();
    let mut connectors = 0usize;
    for row in 0..height {
        let top = f64::from(row) * pw - half_height;
        let bottom = f64::from(row + 1) * pw - half_height;
        for col in 0..width {
            let depth = heightfield.depth(row, col);
            let z = f64::from(depth) * pw;
            let left = f64::from(col) * pw - half_width;
            let right = f64::from(col + 1) * pw - half_width;

            plates.push(Plate::new(
                PlateKind::Top { row, col },
                [
                    Point3::new(left, top, z),
                    Point3::new(right, top, z),
                    Point3::new(right, bottom, z),
                    Point3::new(left, bottom, z),
                ],
                TOP_NORMAL,
                base,
            ));

            if col + 1 < width {
                let neighbour = heightfield.depth(row, col + 1);
                for (d1, d2) in depth_steps(depth, neighbour) {
                    let (z1, z2) = (f64::from(d1) * pw, f64::from(d2) * pw);
                    let sign = if d2 > d1 { 1.0 } else { -1.0 };
                    plates.push(Plate::new(
                        PlateKind::Connector {
                            row,
                            col,
                            axis: Axis::Column,
                            from_depth: d1,
                            to_depth: d2,
                        },
                        [
                            Point3::new(right, top, z1),
                            Point3::new(right, top, z2),
                            Point3::new(right, bottom, z2),
                            Point3::new(right, bottom, z1),
                        ],
                        Vec3::new(sign, 0.0, 0.0),
                        Material {
                            color: connector_tint(tint_rng, scene.color_rate),
                            ..base
                        },
                    ));
                    connectors += 1;
                }
            }

            if row + 1 < height {
                let neighbour = heightfield.depth(row + 1, col);
                for (d1, d2) in depth_steps(depth, neighbour) {
                    let (z1, z2) = (f64::from(d1) * pw, f64::from(d2) * pw);
                    let sign = if d2 > d1 { 1.0 } else { -1.0 };
                    plates.push(Plate::new(
                        PlateKind::Connector {
                            row,
                            col,
                            axis: Axis::Row,
                            from_depth: d1,
                            to_depth: d2,
                        },
                        [
                            Point3::new(left, bottom, z1),
                            Point3::new(right, bottom, z1),
                            Point3::new(right, bottom, z2),
                            Point3::new(left, bottom, z2),
                        ],
                        Vec3::new(0.0, sign, 0.0),
                        Material {
                            color: connector_tint(tint_rng, scene.color_rate),
                            ..base
                        },
                    ));
                    connectors += 1;
                }
            }
        }
    }

    log::debug!(
        "built {} plates ({} top, {connectors} connectors)",
        plates.len(),
        plates.len() - connectors
    );
    plates
}

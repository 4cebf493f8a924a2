//! Per-plate sample grids.

use crate::math::*;
use crate::scene::{Emitter, Plate, Scene};
use rayon::prelude::*;

/// World position of sample `(x, y)` on a quad, at the centre of its grid cell.
///
/// `x` runs along corner 0 → 1 and `y` along corner 0 → 3.
#[inline]
pub fn sample_position(corners: &[Point3; 4], resolution: u32, x: u32, y: u32) -> Point3 {
    let res = f64::from(resolution);
    let along_x = corners[1] - corners[0];
    let along_y = corners[3] - corners[0];
    corners[0] + along_x * ((f64::from(x) + 0.5) / res) + along_y * ((f64::from(y) + 0.5) / res)
}

/// Allocates one plate's buffers and fixes its emitter positions.
///
/// Receivers and emitter energy are zeroed; positions are laid out row-major (`y * res + x`).
pub fn prepare_plate(plate: &mut Plate, resolution: u32) {
    let samples = resolution as usize * resolution as usize;
    plate.receivers.clear();
    plate.receivers.resize(samples, Color::zero());

    plate.emitters.clear();
    plate.emitters.reserve(samples);
    for y in 0..resolution {
        for x in 0..resolution {
            plate.emitters.push(Emitter {
                position: sample_position(&plate.corners, resolution, x, y),
                energy: Color::zero(),
            });
        }
    }
}

/// Prepares every plate in parallel; plates never read each other here.
pub fn prepare_plates(scene: &Scene, plates: &mut [Plate]) {
    let resolution = scene.resolution;
    plates
        .par_iter_mut()
        .for_each(|plate| prepare_plate(plate, resolution));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, PlateKind};
    use rstest::rstest;

    fn square(side: f64) -> Plate {
        Plate::new(
            PlateKind::Top { row: 0, col: 0 },
            [
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(side, 0.0, 1.0),
                Point3::new(side, side, 1.0),
                Point3::new(0.0, side, 1.0),
            ],
            Vec3::new(0.0, 0.0, -1.0),
            Material {
                color: Color::ones(),
                retransmission: 0.5,
            },
        )
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    #[case(7)]
    #[case(16)]
    fn buffers_have_resolution_squared_entries(#[case] resolution: u32) {
        let mut plate = square(1.0);
        prepare_plate(&mut plate, resolution);
        let expected = (resolution * resolution) as usize;
        assert_eq!(plate.receivers.len(), expected);
        assert_eq!(plate.emitters.len(), expected);
    }

    #[test]
    fn samples_sit_at_cell_centres() {
        let mut plate = square(4.0);
        prepare_plate(&mut plate, 4);
        assert_eq!(plate.emitters[0].position, Point3::new(0.5, 0.5, 1.0));
        assert_eq!(plate.emitters[1].position, Point3::new(1.5, 0.5, 1.0));
        assert_eq!(plate.emitters[4].position, Point3::new(0.5, 1.5, 1.0));
        assert_eq!(plate.emitters[15].position, Point3::new(3.5, 3.5, 1.0));
    }

    #[test]
    fn single_sample_is_the_centre() {
        let mut plate = square(2.0);
        prepare_plate(&mut plate, 1);
        assert_eq!(plate.emitters[0].position, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn preparing_resets_energy() {
        let mut plate = square(1.0);
        prepare_plate(&mut plate, 2);
        plate.receivers[0] = Color::ones();
        plate.emitters[1].energy = Color::ones();
        prepare_plate(&mut plate, 2);
        assert!(plate.receivers.iter().all(|&r| r == Color::zero()));
        assert!(plate.emitters.iter().all(|e| e.energy == Color::zero()));
    }
}

use crate::error::ExportError;
use crate::math::*;
use crate::scene::{Plate, ENERGY_SCALE};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::Path;

/// Maps accumulated receiver energy to an 8-bit color.
///
/// Energy is divided by [`ENERGY_SCALE`], clamped to [0, 1] per channel and truncated to 0–255.
#[inline]
pub fn energy_to_rgb8(energy: Color) -> [u8; 3] {
    let c = (energy / ENERGY_SCALE).saturate();
    [
        (c.x * 255.0) as u8,
        (c.y * 255.0) as u8,
        (c.z * 255.0) as u8,
    ]
}

/// Fills every plate's color buffer from its receivers.
pub fn convert(plates: &mut [Plate]) {
    plates.par_iter_mut().for_each(|plate| {
        plate.colors = plate.receivers.iter().copied().map(energy_to_rgb8).collect();
    });
}

// ─── Atlas ──────────────────────────────────────────────────────────────────

/// All plate textures packed into one image, one `resolution × resolution` tile per plate,
/// tiles laid out row by row in plate order.
pub struct Atlas {
    pub width: u32,
    pub height: u32,
    pub columns: u32,
    pub tile: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl Atlas {
    pub fn pack(plates: &[Plate], resolution: u32) -> Result<Self, ExportError> {
        if plates.is_empty() {
            return Err(ExportError::Empty);
        }
        let expected = resolution as usize * resolution as usize;
        if let Some((index, plate)) = plates
            .iter()
            .enumerate()
            .find(|(_, p)| p.colors.len() != expected)
        {
            return Err(ExportError::ColorCount {
                index,
                expected,
                actual: plate.colors.len(),
            });
        }

        let count = plates.len() as u32;
        let columns = (f64::from(count).sqrt().ceil() as u32).max(1);
        let rows = count.div_ceil(columns);
        let width = columns * resolution;
        let height = rows * resolution;
        let mut pixels = vec![[0u8; 3]; width as usize * height as usize];

        for (i, plate) in plates.iter().enumerate() {
            let i = i as u32;
            let ox = (i % columns) * resolution;
            let oy = (i / columns) * resolution;
            for (row, texels) in plate.colors.chunks(resolution as usize).enumerate() {
                let start = (oy as usize + row) * width as usize + ox as usize;
                pixels[start..start + texels.len()].copy_from_slice(texels);
            }
        }

        Ok(Self {
            width,
            height,
            columns,
            tile: resolution,
            pixels,
        })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Writes the atlas as a binary PPM (P6): RGB triplets, one byte per channel.
    pub fn write_ppm_to(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for pixel in &self.pixels {
            out.write_all(pixel)?;
        }
        out.flush()
    }

    pub fn write_ppm(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let mut file = io::BufWriter::new(std::fs::File::create(path)?);
        self.write_ppm_to(&mut file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, PlateKind};
    use rstest::rstest;

    #[rstest]
    #[case(Color::zero(), [0, 0, 0])]
    #[case(Color::splat(ENERGY_SCALE), [255, 255, 255])]
    #[case(Color::splat(ENERGY_SCALE * 7.0), [255, 255, 255])]
    #[case(Color::splat(-3.0), [0, 0, 0])]
    #[case(Color::new(500.0, 0.0, 1000.0), [127, 0, 255])]
    fn clamps_and_scales(#[case] energy: Color, #[case] expected: [u8; 3]) {
        assert_eq!(energy_to_rgb8(energy), expected);
    }

    fn plate_with_colors(colors: Vec<[u8; 3]>) -> Plate {
        let mut plate = Plate::new(
            PlateKind::Top { row: 0, col: 0 },
            [Point3::zero(); 4],
            Vec3::new(0.0, 0.0, -1.0),
            Material {
                color: Color::ones(),
                retransmission: 0.0,
            },
        );
        plate.colors = colors;
        plate
    }

    #[test]
    fn convert_fills_every_plate() {
        let mut plate = plate_with_colors(Vec::new());
        plate.receivers = vec![Color::zero(), Color::splat(2000.0), Color::splat(-1.0)];
        let mut plates = vec![plate];
        convert(&mut plates);
        assert_eq!(plates[0].colors, vec![[0, 0, 0], [255, 255, 255], [0, 0, 0]]);
    }

    #[test]
    fn atlas_places_tiles_in_plate_order() {
        let plates: Vec<Plate> = (0..3u8)
            .map(|i| plate_with_colors(vec![[i, 0, 0]; 4]))
            .collect();
        let atlas = Atlas::pack(&plates, 2).unwrap();
        assert_eq!((atlas.columns, atlas.width, atlas.height), (2, 4, 4));
        assert_eq!(atlas.get(0, 0), [0, 0, 0]);
        assert_eq!(atlas.get(3, 1), [1, 0, 0]);
        assert_eq!(atlas.get(1, 3), [2, 0, 0]);
        // The unused fourth tile stays black.
        assert_eq!(atlas.get(3, 3), [0, 0, 0]);
    }

    #[test]
    fn atlas_rejects_unconverted_plates() {
        let plates = vec![plate_with_colors(Vec::new())];
        assert!(matches!(
            Atlas::pack(&plates, 2),
            Err(ExportError::ColorCount { index: 0, expected: 4, actual: 0 })
        ));
        assert!(matches!(Atlas::pack(&[], 2), Err(ExportError::Empty)));
    }

    #[test]
    fn ppm_header_and_payload() {
        let plates = vec![plate_with_colors(vec![[1, 2, 3]])];
        let atlas = Atlas::pack(&plates, 1).unwrap();
        let mut bytes = Vec::new();
        atlas.write_ppm_to(&mut bytes).unwrap();
        assert_eq!(bytes, b"P6\n1 1\n255\n\x01\x02\x03".to_vec());
    }
}

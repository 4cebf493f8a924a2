//! Terminal preview of a finished bake: the top faces seen from above, drawn with half-block
//! characters in 24-bit color.

use crate::scene::{Plate, PlateKind};
use crossterm::style::{self, Stylize};
use std::io::{self, Write};

/// Top-down image of the top plates, `cell_px` pixels per grid cell.
pub struct TopView {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl TopView {
    /// Resamples each top plate's colors (nearest texel) into its cell of the image.
    ///
    /// Returns `None` if there are no converted top plates.
    pub fn from_plates(plates: &[Plate], resolution: u32, cell_px: u32) -> Option<Self> {
        let cell_px = cell_px.max(1);
        let texels = resolution as usize * resolution as usize;
        let tops: Vec<(u32, u32, &Plate)> = plates
            .iter()
            .filter_map(|p| match p.kind {
                PlateKind::Top { row, col } if p.colors.len() == texels => Some((row, col, p)),
                _ => None,
            })
            .collect();
        let rows = tops.iter().map(|&(row, _, _)| row).max()? + 1;
        let cols = tops.iter().map(|&(_, col, _)| col).max()? + 1;

        let width = cols * cell_px;
        let height = rows * cell_px;
        let mut pixels = vec![[0u8; 3]; width as usize * height as usize];
        for (row, col, plate) in tops {
            for py in 0..cell_px {
                let ty = py * resolution / cell_px;
                for px in 0..cell_px {
                    let tx = px * resolution / cell_px;
                    let x = col * cell_px + px;
                    let y = row * cell_px + py;
                    pixels[(y * width + x) as usize] =
                        plate.colors[(ty * resolution + tx) as usize];
                }
            }
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Two vertical pixels per character cell; an odd last row is paired with black.
    pub fn write_halfblock(&self, out: &mut impl Write) -> io::Result<()> {
        let rows = self.height.div_ceil(2);
        for row in 0..rows {
            for x in 0..self.width {
                let [tr, tg, tb] = self.get(x, row * 2);
                let [br, bg, bb] = if row * 2 + 1 < self.height {
                    self.get(x, row * 2 + 1)
                } else {
                    [0, 0, 0]
                };
                write!(
                    out,
                    "{}",
                    "▀"
                        .with(style::Color::Rgb {
                            r: tr,
                            g: tg,
                            b: tb
                        })
                        .on(style::Color::Rgb {
                            r: br,
                            g: bg,
                            b: bb
                        })
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn display(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::new(stdout.lock());
        self.write_halfblock(&mut out)?;
        out.flush()
    }
}

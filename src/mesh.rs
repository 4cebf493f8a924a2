use crate::scene::Plate;

/// Floats per vertex: position `xyz` followed by texture coordinate `uv`.
pub const VERTEX_STRIDE: usize = 5;

/// Two triangles per quad, corners `0 1 2` and `2 3 0`.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// GPU-ready geometry: four interleaved vertices and six indices per plate, in plate order,
/// so plate `i` draws indices `6 * i .. 6 * i + 6` with texture `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn from_plates(plates: &[Plate]) -> Self {
        let mut vertices = Vec::with_capacity(plates.len() * 4 * VERTEX_STRIDE);
        let mut indices = Vec::with_capacity(plates.len() * QUAD_INDICES.len());
        for (i, plate) in plates.iter().enumerate() {
            for (corner, uv) in plate.corners.iter().zip(&plate.tex_coords) {
                vertices.extend_from_slice(&[
                    corner.x as f32,
                    corner.y as f32,
                    corner.z as f32,
                    uv[0] as f32,
                    uv[1] as f32,
                ]);
            }
            let offset = 4 * i as u32;
            indices.extend(QUAD_INDICES.iter().map(|&k| offset + k));
        }
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}

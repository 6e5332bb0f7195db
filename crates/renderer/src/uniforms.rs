use bytemuck::{Pod, Zeroable};

use crate::types::OutputSize;

/// Contents of the uniform buffer: a column-major projection matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadUniforms {
    pub projection: [[f32; 4]; 4],
}

impl QuadUniforms {
    pub const IDENTITY: QuadUniforms = QuadUniforms {
        projection: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Orthographic projection from pixel space `[0, width] x [0, height]`
    /// (origin bottom-left) onto normalized device coordinates `[-1, 1]`.
    pub fn orthographic(size: OutputSize) -> Self {
        let (l, r) = (0.0f32, size.width.max(1) as f32);
        let (b, t) = (0.0f32, size.height.max(1) as f32);
        let (n, f) = (-1.0f32, 1.0f32);

        Self {
            projection: [
                [2.0 / (r - l), 0.0, 0.0, 0.0],
                [0.0, 2.0 / (t - b), 0.0, 0.0],
                [0.0, 0.0, -2.0 / (f - n), 0.0],
                [
                    -(r + l) / (r - l),
                    -(t + b) / (t - b),
                    -(f + n) / (f - n),
                    1.0,
                ],
            ],
        }
    }

    /// Applies the matrix to the pixel-space point `(x, y, 0, 1)`.
    pub fn project(&self, x: f32, y: f32) -> [f32; 4] {
        let v = [x, y, 0.0, 1.0];
        let m = &self.projection;
        std::array::from_fn(|row| (0..4).map(|col| m[col][row] * v[col]).sum())
    }
}

impl Default for QuadUniforms {
    fn default() -> Self {
        Self::IDENTITY
    }
}

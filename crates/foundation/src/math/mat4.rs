//! Column-major 4x4 matrices.
//!
//! Storage is `cols[col][row]`, the layout WGSL/GLSL uniforms expect. The flat
//! view (`to_cols_array`) indexes element `col * 4 + row`, so translation lives
//! in elements 12..15.

use super::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [[f64; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_cols_array(m: &[f64; 16]) -> Self {
        Self {
            cols: [
                [m[0], m[1], m[2], m[3]],
                [m[4], m[5], m[6], m[7]],
                [m[8], m[9], m[10], m[11]],
                [m[12], m[13], m[14], m[15]],
            ],
        }
    }

    pub fn to_cols_array(&self) -> [f64; 16] {
        let c = &self.cols;
        [
            c[0][0], c[0][1], c[0][2], c[0][3], c[1][0], c[1][1], c[1][2], c[1][3], c[2][0],
            c[2][1], c[2][2], c[2][3], c[3][0], c[3][1], c[3][2], c[3][3],
        ]
    }

    /// Narrowed copy for GPU upload.
    pub fn to_cols_f32(&self) -> [[f32; 4]; 4] {
        self.cols.map(|col| col.map(|v| v as f32))
    }

    pub fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    pub fn scale(s: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = s.x;
        m.cols[1][1] = s.y;
        m.cols[2][2] = s.z;
        m
    }

    /// Right-handed rotation about +X.
    pub fn rotation_x(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Right-handed rotation about +Z.
    pub fn rotation_z(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Symmetric right-handed perspective with OpenGL clip depth:
    /// view-space z in `[-near, -far]` maps to NDC z in `[-1, 1]`.
    pub fn perspective_rh_gl(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (0.5 * fov_y_rad).tan();
        let nf = 1.0 / (near - far);
        Self {
            cols: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, (far + near) * nf, -1.0],
                [0.0, 0.0, 2.0 * far * near * nf, 0.0],
            ],
        }
    }

    /// `self = m * self`. Chained calls apply `m` after everything already in `self`.
    pub fn premultiply(&mut self, m: &Mat4) -> &mut Self {
        *self = *m * *self;
        self
    }

    pub fn mul_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let m = &self.cols;
        [
            m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2] + m[3][0] * v[3],
            m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2] + m[3][1] * v[3],
            m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2] + m[3][2] * v[3],
            m[0][3] * v[0] + m[1][3] * v[1] + m[2][3] * v[2] + m[3][3] * v[3],
        ]
    }

    /// Affine point transform (w = 1, no perspective divide).
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        let [x, y, z, _] = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        Vec3::new(x, y, z)
    }

    /// Direction transform (w = 0).
    pub fn transform_vector3(&self, v: Vec3) -> Vec3 {
        let [x, y, z, _] = self.mul_vec4([v.x, v.y, v.z, 0.0]);
        Vec3::new(x, y, z)
    }

    /// Point transform followed by the perspective divide.
    ///
    /// Returns `None` when the point lands on the `w = 0` plane.
    pub fn project_point3(&self, p: Vec3) -> Option<Vec3> {
        let [x, y, z, w] = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        if w.abs() < 1e-12 {
            return None;
        }
        Some(Vec3::new(x / w, y / w, z / w))
    }

    pub fn translation_part(&self) -> Vec3 {
        let t = self.cols[3];
        Vec3::new(t[0], t[1], t[2])
    }

    pub fn determinant(&self) -> f64 {
        let b = Cofactors::of(&self.to_cols_array());
        b.det()
    }

    /// General inverse, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Mat4> {
        let a = self.to_cols_array();
        let b = Cofactors::of(&a);
        let det = b.det();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;

        let out = [
            (a[5] * b.b11 - a[6] * b.b10 + a[7] * b.b09) * inv,
            (a[2] * b.b10 - a[1] * b.b11 - a[3] * b.b09) * inv,
            (a[13] * b.b05 - a[14] * b.b04 + a[15] * b.b03) * inv,
            (a[10] * b.b04 - a[9] * b.b05 - a[11] * b.b03) * inv,
            (a[6] * b.b08 - a[4] * b.b11 - a[7] * b.b07) * inv,
            (a[0] * b.b11 - a[2] * b.b08 + a[3] * b.b07) * inv,
            (a[14] * b.b02 - a[12] * b.b05 - a[15] * b.b01) * inv,
            (a[8] * b.b05 - a[10] * b.b02 + a[11] * b.b01) * inv,
            (a[4] * b.b10 - a[5] * b.b08 + a[7] * b.b06) * inv,
            (a[1] * b.b08 - a[0] * b.b10 - a[3] * b.b06) * inv,
            (a[12] * b.b04 - a[13] * b.b02 + a[15] * b.b00) * inv,
            (a[9] * b.b02 - a[8] * b.b04 - a[11] * b.b00) * inv,
            (a[5] * b.b07 - a[4] * b.b09 - a[6] * b.b06) * inv,
            (a[0] * b.b09 - a[1] * b.b07 + a[2] * b.b06) * inv,
            (a[13] * b.b01 - a[12] * b.b03 - a[14] * b.b00) * inv,
            (a[8] * b.b03 - a[9] * b.b01 + a[10] * b.b00) * inv,
        ];
        Some(Mat4::from_cols_array(&out))
    }

    /// Largest absolute element-wise difference.
    pub fn max_abs_diff(&self, other: &Mat4) -> f64 {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// 2x2 sub-determinants shared by `determinant` and `inverse`.
struct Cofactors {
    b00: f64,
    b01: f64,
    b02: f64,
    b03: f64,
    b04: f64,
    b05: f64,
    b06: f64,
    b07: f64,
    b08: f64,
    b09: f64,
    b10: f64,
    b11: f64,
}

impl Cofactors {
    fn of(a: &[f64; 16]) -> Self {
        Self {
            b00: a[0] * a[5] - a[1] * a[4],
            b01: a[0] * a[6] - a[2] * a[4],
            b02: a[0] * a[7] - a[3] * a[4],
            b03: a[1] * a[6] - a[2] * a[5],
            b04: a[1] * a[7] - a[3] * a[5],
            b05: a[2] * a[7] - a[3] * a[6],
            b06: a[8] * a[13] - a[9] * a[12],
            b07: a[8] * a[14] - a[10] * a[12],
            b08: a[8] * a[15] - a[11] * a[12],
            b09: a[9] * a[14] - a[10] * a[13],
            b10: a[9] * a[15] - a[11] * a[13],
            b11: a[10] * a[15] - a[11] * a[14],
        }
    }

    fn det(&self) -> f64 {
        self.b00 * self.b11 - self.b01 * self.b10 + self.b02 * self.b09 + self.b03 * self.b08
            - self.b04 * self.b07
            + self.b05 * self.b06
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, b: Mat4) -> Mat4 {
        // Column-major multiply: c = a * b
        let a = &self.cols;
        let mut c = [[0.0f64; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                c[col][row] = a[0][row] * b.cols[col][0]
                    + a[1][row] * b.cols[col][1]
                    + a[2][row] * b.cols[col][2]
                    + a[3][row] * b.cols[col][3];
            }
        }
        Mat4 { cols: c }
    }
}

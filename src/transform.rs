/// A 4x4 transformation matrix stored in row-major order.
///
/// Column vectors are assumed: `a.then(&b)` applies `b` first, then `a`,
/// so a model-view stack is built by composing parent with child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Matrix data in row-major order: [row0, row1, row2, row3]
    pub data: [f32; 16],
}

impl Transform {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, 0.0, // row 0
            0.0, 1.0, 0.0, 0.0, // row 1
            0.0, 0.0, 1.0, 0.0, // row 2
            0.0, 0.0, 0.0, 1.0, // row 3
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, x, // row 0
                0.0, 1.0, 0.0, y, // row 1
                0.0, 0.0, 1.0, z, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // row 0
                0.0, sy, 0.0, 0.0, // row 1
                0.0, 0.0, sz, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Rotation about the X axis, right-handed.
    pub fn rotate_x_degrees(angle_degrees: f32) -> Self {
        let (sin, cos) = sin_cos_degrees(angle_degrees);
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // row 0
                0.0, cos, -sin, 0.0, // row 1
                0.0, sin, cos, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Rotation about the Y axis, right-handed.
    pub fn rotate_y_degrees(angle_degrees: f32) -> Self {
        let (sin, cos) = sin_cos_degrees(angle_degrees);
        Self {
            data: [
                cos, 0.0, sin, 0.0, // row 0
                0.0, 1.0, 0.0, 0.0, // row 1
                -sin, 0.0, cos, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Perspective projection with a vertical field of view, mapping
    /// `-near..-far` on the view axis to clip depth `0..1`.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y_degrees.to_radians() / 2.0).tan();
        let range = near - far;
        Self {
            data: [
                f / aspect, 0.0, 0.0, 0.0, // row 0
                0.0, f, 0.0, 0.0, // row 1
                0.0, 0.0, far / range, near * far / range, // row 2
                0.0, 0.0, -1.0, 0.0, // row 3
            ],
        }
    }

    /// Orthographic projection of the box `left..right`, `bottom..top`,
    /// `-near..-far` onto clip space with depth `0..1`.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let range = near - far;
        Self {
            data: [
                2.0 / rl, 0.0, 0.0, -(right + left) / rl, // row 0
                0.0, 2.0 / tb, 0.0, -(top + bottom) / tb, // row 1
                0.0, 0.0, 1.0 / range, near / range, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// View matrix for an eye at `eye` looking at `target` with `up`.
    pub fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> Self {
        let f = normalize(sub(target, eye));
        let s = normalize(cross(f, up));
        let u = cross(s, f);
        Self {
            data: [
                s[0], s[1], s[2], -dot(s, eye), // row 0
                u[0], u[1], u[2], -dot(u, eye), // row 1
                -f[0], -f[1], -f[2], dot(f, eye), // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Compose this transform with another: self * other
    /// Applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        let a = &self.data;
        let b = &other.data;

        // Row-major indexing: element at row i, col j is at index i*4 + j
        let mut result = [0.0f32; 16];

        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[i * 4 + k] * b[k * 4 + j];
                }
                result[i * 4 + j] = sum;
            }
        }

        Transform { data: result }
    }

    /// Transform a homogeneous point `(x, y, z, 1)`, returning all four components.
    pub fn transform_point4(&self, x: f32, y: f32, z: f32) -> [f32; 4] {
        let d = &self.data;
        [
            d[0] * x + d[1] * y + d[2] * z + d[3],
            d[4] * x + d[5] * y + d[6] * z + d[7],
            d[8] * x + d[9] * y + d[10] * z + d[11],
            d[12] * x + d[13] * y + d[14] * z + d[15],
        ]
    }

    /// Transform a point and divide by `w`.
    pub fn transform_point(&self, x: f32, y: f32, z: f32) -> [f32; 3] {
        let [px, py, pz, w] = self.transform_point4(x, y, z);
        if w.abs() < 1e-10 {
            return [px, py, pz];
        }
        [px / w, py / w, pz / w]
    }

    /// Get the rows of the matrix for passing to the shader
    pub fn rows(&self) -> [[f32; 4]; 4] {
        [
            [self.data[0], self.data[1], self.data[2], self.data[3]],
            [self.data[4], self.data[5], self.data[6], self.data[7]],
            [self.data[8], self.data[9], self.data[10], self.data[11]],
            [self.data[12], self.data[13], self.data[14], self.data[15]],
        ]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Sine and cosine of an angle in degrees, exact at multiples of 90 so
/// that flat layers stay exactly coplanar.
fn sin_cos_degrees(angle_degrees: f32) -> (f32, f32) {
    if angle_degrees % 90.0 == 0.0 {
        match (angle_degrees / 90.0).rem_euclid(4.0) as i32 {
            0 => return (0.0, 1.0),
            1 => return (1.0, 0.0),
            2 => return (0.0, -1.0),
            3 => return (-1.0, 0.0),
            _ => {}
        }
    }
    angle_degrees.to_radians().sin_cos()
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len < 1e-10 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert_eq!(t, Transform::IDENTITY);
        assert!(t.is_identity());
    }

    #[test]
    fn test_translate() {
        let t = Transform::translate(10.0, 20.0, -5.0);
        let [x, y, z] = t.transform_point(1.0, 1.0, 1.0);
        assert!(approx_eq(x, 11.0));
        assert!(approx_eq(y, 21.0));
        assert!(approx_eq(z, -4.0));
    }

    #[test]
    fn test_rotate_x_flips_y_at_180() {
        let t = Transform::rotate_x_degrees(180.0);
        let [x, y, z] = t.transform_point(3.0, 4.0, 0.0);
        assert!(approx_eq(x, 3.0));
        assert!(approx_eq(y, -4.0));
        assert!(approx_eq(z, 0.0));
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let t = Transform::rotate_x_degrees(180.0);
        assert_eq!(t.transform_point(0.0, 7.0, 3.0), [0.0, -7.0, -3.0]);
        let t = Transform::rotate_y_degrees(-90.0);
        assert_eq!(t.transform_point(1.0, 0.0, 0.0), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rotate_y() {
        let t = Transform::rotate_y_degrees(90.0);
        let [x, _, z] = t.transform_point(1.0, 0.0, 0.0);
        assert!(approx_eq(x, 0.0));
        assert!(approx_eq(z, -1.0));
    }

    #[test]
    fn test_compose() {
        // scale.then(translate): first translate, then scale
        let translate = Transform::translate(10.0, 0.0, 0.0);
        let scale = Transform::scale(2.0, 2.0, 2.0);
        let [x, y, _] = scale.then(&translate).transform_point(0.0, 0.0, 0.0);
        assert!(approx_eq(x, 20.0));
        assert!(approx_eq(y, 0.0));
    }

    #[test]
    fn test_ortho_maps_corners() {
        // Top-left origin, y down: (0,0) is the top-left of clip space
        let t = Transform::ortho(0.0, 200.0, 100.0, 0.0, 1.0, 4000.0);
        let [x, y, z] = t.transform_point(0.0, 0.0, -1.0);
        assert!(approx_eq(x, -1.0));
        assert!(approx_eq(y, 1.0));
        assert!(approx_eq(z, 0.0));
        let [x, y, z] = t.transform_point(200.0, 100.0, -4000.0);
        assert!(approx_eq(x, 1.0));
        assert!(approx_eq(y, -1.0));
        assert!(approx_eq(z, 1.0));
    }

    #[test]
    fn test_perspective_depth_range() {
        let t = Transform::perspective(45.0, 1.0, 1.0, 4000.0);
        let [_, _, near] = t.transform_point(0.0, 0.0, -1.0);
        let [_, _, far] = t.transform_point(0.0, 0.0, -4000.0);
        assert!(approx_eq(near, 0.0));
        assert!(approx_eq(far, 1.0));
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let t = Transform::look_at([0.0, 0.0, 2000.0], [0.0; 3], [0.0, 1.0, 0.0]);
        let [x, y, z] = t.transform_point(0.0, 0.0, 0.0);
        assert!(approx_eq(x, 0.0));
        assert!(approx_eq(y, 0.0));
        assert!(approx_eq(z, -2000.0));
    }

    #[test]
    fn test_rows() {
        let t = Transform::translate(1.0, 2.0, 3.0);
        let rows = t.rows();
        assert_eq!(rows[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[1], [0.0, 1.0, 0.0, 2.0]);
        assert_eq!(rows[2], [0.0, 0.0, 1.0, 3.0]);
        assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);
    }
}

//! Mathematical types shared by every FRACTALIS crate.
//!
//! These are the canonical representations used by the hierarchy, the
//! surface evaluators and the GPU upload path. Everything here is `Pod`
//! so it can be handed to the GPU without conversion.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Below this length a vector is treated as degenerate.
const EPSILON: f32 = 1.0e-8;

/// 3D Vector - position, direction, scale
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector with all components set to `value`
    #[must_use]
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All ones
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Unit X vector (right)
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector (up)
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector (forward)
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Returns the unit vector, or zero for a degenerate input
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let length = self.length();
        if length > EPSILON {
            self * (1.0 / length)
        } else {
            Self::ZERO
        }
    }

    /// Component-wise absolute value
    #[must_use]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Largest component
    #[must_use]
    pub fn max_element(self) -> f32 {
        self.x.max(self.y).max(self.z)
    }

    /// Linear interpolation towards `other`
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Component-wise product (non-uniform scaling)
impl std::ops::Mul<Vec3> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

/// 4D Vector - shader seeds and packed configuration
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Vec4 {
    /// Creates a new Vec4
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians about a unit `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Rotation about the X axis.
    #[must_use]
    pub fn from_rotation_x(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::X, angle)
    }

    /// Rotation about the Y (up) axis.
    #[must_use]
    pub fn from_rotation_y(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::Y, angle)
    }

    /// Rotation about the Z axis.
    #[must_use]
    pub fn from_rotation_z(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::Z, angle)
    }

    /// Dot product of the four components
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Returns the unit quaternion, or identity for a degenerate input
    #[must_use]
    pub fn normalize(self) -> Self {
        let length = self.dot(self).sqrt();
        if length > EPSILON {
            let inv = 1.0 / length;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Inverse rotation (for unit quaternions)
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Angle in radians between two rotations.
    ///
    /// `q` and `-q` describe the same rotation and compare as equal.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f32 {
        let dot = self.dot(other).abs().min(1.0);
        2.0 * dot.acos()
    }

    /// Columns of the equivalent 3x3 rotation matrix.
    #[must_use]
    pub fn to_columns(self) -> [Vec3; 3] {
        let Self { x, y, z, w } = self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        [
            Vec3::new(1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy)),
            Vec3::new(2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx)),
            Vec3::new(2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy)),
        ]
    }

    /// Recovers a rotation from orthonormal matrix columns.
    #[must_use]
    pub fn from_columns(columns: [Vec3; 3]) -> Self {
        let [c0, c1, c2] = columns;
        let (m00, m10, m20) = (c0.x, c0.y, c0.z);
        let (m01, m11, m21) = (c1.x, c1.y, c1.z);
        let (m02, m12, m22) = (c2.x, c2.y, c2.z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`.
impl std::ops::Mul for Quaternion {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let a = self;
        let b = rhs;
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

/// Rotates a vector.
impl std::ops::Mul<Vec3> for Quaternion {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }
}

/// Transform - position + rotation + non-uniform scale
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Rotation
    pub rotation: Quaternion,
    /// Scale per axis
    pub scale: Vec3,
}

impl Transform {
    /// Creates a new transform
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, Vec3::ONE);

    /// Uniform scale used for hierarchies: the X component.
    #[must_use]
    pub const fn uniform_scale(&self) -> f32 {
        self.scale.x
    }

    /// Packs this transform into a 3x4 matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Float3x4 {
        Float3x4::from_trs(self.position, self.rotation, self.scale)
    }

    /// Maps a direction into world space for normals.
    ///
    /// Uses the inverse-transpose of the linear part, which for a TRS
    /// transform is the rotation applied after dividing by the scale.
    /// A zero scale component collapses that axis instead of producing NaN.
    #[must_use]
    pub fn transform_normal(&self, normal: Vec3) -> Vec3 {
        let inv = |s: f32| if s.abs() > EPSILON { 1.0 / s } else { 0.0 };
        let scaled = normal * Vec3::new(inv(self.scale.x), inv(self.scale.y), inv(self.scale.z));
        (self.rotation * scaled).normalize_or_zero()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Column-compressed 3x4 matrix.
///
/// Used both as the packed per-instance transform (three scaled rotation
/// columns plus translation) and as four grid cells packed side by side,
/// one `float3` per column. Either way it is 48 bytes with no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Float3x4 {
    /// First column
    pub c0: [f32; 3],
    /// Second column
    pub c1: [f32; 3],
    /// Third column
    pub c2: [f32; 3],
    /// Fourth column (translation for transforms)
    pub c3: [f32; 3],
}

impl Float3x4 {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Builds a matrix from four columns.
    #[must_use]
    pub const fn from_columns(columns: [Vec3; 4]) -> Self {
        Self {
            c0: columns[0].to_array(),
            c1: columns[1].to_array(),
            c2: columns[2].to_array(),
            c3: columns[3].to_array(),
        }
    }

    /// Returns column `index` (0..4).
    ///
    /// # Panics
    ///
    /// Panics if `index >= 4`.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec3 {
        match index {
            0 => Vec3::from_array(self.c0),
            1 => Vec3::from_array(self.c1),
            2 => Vec3::from_array(self.c2),
            3 => Vec3::from_array(self.c3),
            _ => panic!("Float3x4 column index {index} out of range"),
        }
    }

    /// Translation-rotation-scale matrix.
    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        let [c0, c1, c2] = rotation.to_columns();
        Self::from_columns([c0 * scale.x, c1 * scale.y, c2 * scale.z, position])
    }

    /// Translation-rotation matrix with a uniform scale.
    #[must_use]
    pub fn from_rotation_translation_scale(rotation: Quaternion, position: Vec3, scale: f32) -> Self {
        Self::from_trs(position, rotation, Vec3::splat(scale))
    }

    /// Applies the full affine transform to a point.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform_vector(p) + self.column(3)
    }

    /// Applies only the linear part to a vector.
    #[must_use]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.column(0) * v.x + self.column(1) * v.y + self.column(2) * v.z
    }

    /// Splits a TRS matrix back into translation, rotation and scale.
    ///
    /// Scale is recovered as positive column lengths, so mirrored inputs
    /// come back as a rotation plus a positive scale.
    #[must_use]
    pub fn to_trs(&self) -> (Vec3, Quaternion, Vec3) {
        let columns = [self.column(0), self.column(1), self.column(2)];
        let scale = Vec3::new(columns[0].length(), columns[1].length(), columns[2].length());
        let unit = |c: Vec3, s: f32, fallback: Vec3| if s > EPSILON { c * (1.0 / s) } else { fallback };
        let rotation = Quaternion::from_columns([
            unit(columns[0], scale.x, Vec3::X),
            unit(columns[1], scale.y, Vec3::Y),
            unit(columns[2], scale.z, Vec3::Z),
        ]);
        (self.column(3), rotation, scale)
    }
}

/// Hermite interpolation between `edge0` and `edge1`, clamped to `[0, 1]`.
#[must_use]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

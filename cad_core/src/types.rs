//! Core types for cad_core geometry.
//!
//! Provides the `Point3` vector type and a `Triangle` wrapper used for sampling
//! and volume integration.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A 3D point (or vector) with named fields.
///
/// Stored as `f32`, the precision point clouds are exchanged in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point3 {
    /// The origin.
    pub const ZERO: Self = Self::splat(0.0);

    /// Create a new Point3.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Component along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    pub fn axis(&self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Squared length of the vector.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        libm::sqrtf(self.length_squared())
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Normalize to unit length; a zero vector stays zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self {
            x: libm::fminf(self.x, other.x),
            y: libm::fminf(self.y, other.y),
            z: libm::fminf(self.z, other.z),
        }
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self {
            x: libm::fmaxf(self.x, other.x),
            y: libm::fmaxf(self.y, other.y),
            z: libm::fmaxf(self.z, other.z),
        }
    }

    /// Largest component.
    #[inline]
    pub fn max_element(self) -> f32 {
        libm::fmaxf(self.x, libm::fmaxf(self.y, self.z))
    }

    /// Whether every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        p.as_array()
    }
}

impl From<(f32, f32, f32)> for Point3 {
    #[inline]
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self { x, y, z }
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Point3 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Point3> for f32 {
    type Output = Point3;

    #[inline]
    fn mul(self, point: Point3) -> Point3 {
        point * self
    }
}

impl Div<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Point3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A triangle given by its three corners, counter-clockwise seen from outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle(pub [Point3; 3]);

impl Triangle {
    /// Create a triangle from three corners.
    #[inline]
    pub const fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self([a, b, c])
    }

    /// First corner.
    #[inline]
    pub fn a(&self) -> Point3 {
        self.0[0]
    }

    /// Second corner.
    #[inline]
    pub fn b(&self) -> Point3 {
        self.0[1]
    }

    /// Third corner.
    #[inline]
    pub fn c(&self) -> Point3 {
        self.0[2]
    }

    /// Un-normalized normal, `(b - a) × (c - a)`; its length is twice the area.
    #[inline]
    pub fn scaled_normal(&self) -> Point3 {
        (self.b() - self.a()).cross(self.c() - self.a())
    }

    /// Unit normal (zero for degenerate triangles).
    #[inline]
    pub fn normal(&self) -> Point3 {
        self.scaled_normal().normalize()
    }

    /// Surface area.
    #[inline]
    pub fn area(&self) -> f32 {
        0.5 * self.scaled_normal().length()
    }

    /// Centroid of the three corners.
    #[inline]
    pub fn centroid(&self) -> Point3 {
        (self.a() + self.b() + self.c()) / 3.0
    }

    /// Signed volume of the tetrahedron spanned by this triangle and the origin.
    ///
    /// Summed over a closed, consistently oriented surface this yields the
    /// enclosed volume.
    #[inline]
    pub fn signed_volume(&self) -> f32 {
        self.a().dot(self.b().cross(self.c())) / 6.0
    }

    /// Map two uniform variates in `[0, 1)` to a uniformly distributed point
    /// on the triangle.
    #[inline]
    pub fn point_at(&self, u: f32, v: f32) -> Point3 {
        let su = libm::sqrtf(u);
        self.a() * (1.0 - su) + self.b() * (su * (1.0 - v)) + self.c() * (su * v)
    }
}

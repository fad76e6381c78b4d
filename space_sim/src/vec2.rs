// 2D vector value type used by every body in the simulation.
//
// `Vec2` is a plain `Copy` pair of `f32` with the usual operator overloads.
// All simulation quantities (positions, velocities, thrust, gravity) are
// expressed in it. Angles are radians measured counter-clockwise from +x, as
// returned by `atan2`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Polar construction: a vector of length `mag` pointing along `angle`.
    pub fn make_with_angle_mag(angle: f32, mag: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(mag * cos, mag * sin)
    }

    pub fn mag(self) -> f32 {
        self.mag_squared().sqrt()
    }

    pub fn mag_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).mag()
    }

    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction, or `ZERO` for a (near-)zero vector.
    pub fn normalized(self) -> Self {
        let m = self.mag();
        if m > 1e-6 { self / m } else { Self::ZERO }
    }

    /// Scale down to at most `max` length, keeping direction.
    pub fn clamp_mag(self, max: f32) -> Self {
        let m = self.mag();
        if m > max && m > 0.0 {
            self * (max / m)
        } else {
            self
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, s: f32) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, o: Vec2) {
        self.x += o.x;
        self.y += o.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, o: Vec2) {
        self.x -= o.x;
        self.y -= o.y;
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, s: f32) {
        self.x *= s;
        self.y *= s;
    }
}

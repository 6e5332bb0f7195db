use std::ops::{Add, Mul};

/// Two-component single-precision vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Same value in both components.
    pub const fn splat(value: f32) -> Self {
        Self { x: value, y: value }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn min_element(self) -> f32 {
        self.x.min(self.y)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add<f32> for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x + rhs, self.y + rhs)
    }
}

/// Component-wise product.
impl Mul for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// Row-major 2x2 rotation matrix.
///
/// `Matrix2x2::rotation(angle)` rotates counter-clockwise by `angle` radians
/// when applied as `vector * matrix`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix2x2 {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
}

impl Matrix2x2 {
    pub const IDENTITY: Matrix2x2 = Matrix2x2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
    };

    pub fn rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
        }
    }
}

impl Mul<Matrix2x2> for Vector2 {
    type Output = Vector2;

    fn mul(self, m: Matrix2x2) -> Vector2 {
        Vector2::new(m.a * self.x + m.b * self.y, m.c * self.x + m.d * self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_close(actual: Vector2, expected: Vector2) {
        assert!(
            (actual.x - expected.x).abs() < 1e-5 && (actual.y - expected.y).abs() < 1e-5,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn quarter_turn_rotates_counter_clockwise() {
        let rotated = Vector2::new(1.0, 0.0) * Matrix2x2::rotation(FRAC_PI_2);
        assert_close(rotated, Vector2::new(0.0, 1.0));
    }

    #[test]
    fn rotation_preserves_length() {
        let v = Vector2::new(3.0, -4.0);
        let rotated = v * Matrix2x2::rotation(1.234);
        assert!((rotated.length() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn half_turn_negates() {
        let v = Vector2::new(0.25, 0.75);
        assert_close(v * Matrix2x2::rotation(PI), Vector2::new(-0.25, -0.75));
    }

    #[test]
    fn arithmetic_is_component_wise() {
        let v = Vector2::new(2.0, 3.0);
        assert_eq!(v + Vector2::new(1.0, -1.0), Vector2::new(3.0, 2.0));
        assert_eq!(v * Vector2::new(0.5, 2.0), Vector2::new(1.0, 6.0));
        assert_eq!(v * 2.0, Vector2::new(4.0, 6.0));
        assert_eq!(v + 0.5, Vector2::new(2.5, 3.5));
        assert_eq!(v * Matrix2x2::IDENTITY, v);
    }
}

use std::fmt;
use std::ops::{Add, AddAssign};

/// A 2D integer offset, used for both the pointer position and its velocity.
///
/// Positions are unconstrained: they may be negative or lie past the current
/// grid extent. Validity is judged when a cell is actually accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vector2 {
    pub x: i64,
    pub y: i64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2::new(0, 0);
    pub const LEFT: Vector2 = Vector2::new(-1, 0);
    pub const UP: Vector2 = Vector2::new(0, -1);
    pub const RIGHT: Vector2 = Vector2::new(1, 0);
    pub const DOWN: Vector2 = Vector2::new(0, 1);

    /// The four unit directions, in the order `?` draws from.
    pub const DIRECTIONS: [Vector2; 4] = [Self::LEFT, Self::UP, Self::RIGHT, Self::DOWN];

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x.wrapping_add(other.x), self.y.wrapping_add(other.y))
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Vector2) {
        *self = *self + other;
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{x: {}, y: {}}}", self.x, self.y)
    }
}

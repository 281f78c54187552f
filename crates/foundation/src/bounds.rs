/// Axis-aligned bounding box in `[x, y]` order (lon/lat for geographic data).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Inclusive containment with an absolute slack on every side.
    pub fn contains_with_tolerance(&self, p: [f64; 2], eps: f64) -> bool {
        p[0] >= self.min[0] - eps
            && p[0] <= self.max[0] + eps
            && p[1] >= self.min[1] - eps
            && p[1] <= self.max[1] + eps
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn containment_is_inclusive() {
        let b = Aabb2::new([0.0, 0.0], [2.0, 1.0]);
        assert!(b.contains_with_tolerance([0.0, 1.0], 0.0));
        assert!(b.contains_with_tolerance([1.0, 0.5], 0.0));
        assert!(!b.contains_with_tolerance([2.1, 0.5], 0.0));
        assert!(b.contains_with_tolerance([2.1, 0.5], 0.2));
        assert_eq!(b.width(), 2.0);
        assert_eq!(b.height(), 1.0);
    }
}

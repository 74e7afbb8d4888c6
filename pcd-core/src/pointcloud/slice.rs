/// A closed z interval `[target - tolerance, target + tolerance]`.
///
/// The band is applied on absolute z; it is not relative to any ground elevation.
/// A tolerance of 0 keeps only points whose z equals `target` exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightBand {
    pub target: f64,
    pub tolerance: f64,
}

impl HeightBand {
    pub fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }

    pub fn lower(&self) -> f64 {
        self.target - self.tolerance
    }

    pub fn upper(&self) -> f64 {
        self.target + self.tolerance
    }

    #[inline]
    pub fn contains(&self, z: f64) -> bool {
        z >= self.lower() && z <= self.upper()
    }

    /// Returns the points inside the band, in input order.
    pub fn extract(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        points
            .iter()
            .filter(|p| self.contains(p[2]))
            .copied()
            .collect()
    }
}

pub fn points_at_height(
    points: &[[f64; 3]],
    target_height: f64,
    tolerance: f64,
) -> Vec<[f64; 3]> {
    HeightBand::new(target_height, tolerance).extract(points)
}

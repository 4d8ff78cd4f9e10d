use glam::Vec3;

/// Flat attribute storage shared by every group of a model.
///
/// Positions, normals and texture coordinates are independent sequences in
/// file insertion order, referenced only by index. Texture coordinates keep
/// a fixed 0.0 third component so all sequences share one element shape.
/// Face normals are appended after parsing, one per triangle.
#[derive(Debug, Default)]
pub struct GeometryStore {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 3]>,
    pub face_normals: Vec<[f32; 3]>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, index: u32) -> Vec3 {
        Vec3::from_array(self.positions[index as usize])
    }
}

/// Axis-aligned extents plus the derived bounding sphere.
#[derive(Debug, Copy, Clone)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    /// Midpoint of `min` and `max`.
    pub centre: Vec3,
    /// Half the diagonal length.
    pub radius: f32,
}

impl Bounds {
    pub fn of_positions(positions: &[[f32; 3]]) -> Self {
        if positions.is_empty() {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
                centre: Vec3::ZERO,
                radius: 0.0,
            };
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in positions {
            let p = Vec3::from_array(*p);
            min = min.min(p);
            max = max.max(p);
        }

        Self {
            min,
            max,
            centre: 0.5 * (min + max),
            radius: 0.5 * (max - min).length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_of_empty_store_are_degenerate() {
        let b = Bounds::of_positions(&[]);
        assert_eq!(b.centre, Vec3::ZERO);
        assert_eq!(b.radius, 0.0);
    }

    #[test]
    fn bounds_centre_is_extent_midpoint() {
        let b = Bounds::of_positions(&[[-1.0, 0.0, 2.0], [3.0, 4.0, -2.0]]);
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(b.max, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(b.centre, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn bounding_sphere_contains_all_positions() {
        let positions = [
            [0.3, -1.2, 0.9],
            [2.0, 0.0, 0.0],
            [-1.5, 2.5, 0.5],
            [0.0, 0.0, -3.0],
        ];
        let b = Bounds::of_positions(&positions);
        for p in positions {
            let d = (Vec3::from_array(p) - b.centre).length();
            assert!(d <= b.radius + 1e-5, "|p - centre| = {d} > {}", b.radius);
        }
    }
}

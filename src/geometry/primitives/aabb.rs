use nalgebra_glm::{max2, min2};

use crate::helpers::aliases::Vec3f;

/// Axis-aligned bounding box: the pair `(min, max)` with `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Vec3f,
    max: Vec3f,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3f, max: Vec3f) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "min must be componentwise <= max, got min={:?} max={:?}",
            min,
            max
        );

        Self { min, max }
    }

    /// Bounding box of a single point.
    #[inline]
    pub fn from_point(point: Vec3f) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    #[inline]
    pub fn get_min(&self) -> &Vec3f {
        &self.min
    }

    #[inline]
    pub fn get_max(&self) -> &Vec3f {
        &self.max
    }

    #[inline]
    pub fn centroid(&self) -> Vec3f {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size_x(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn size_y(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size_z(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Index (0, 1 or 2) of the axis along which this box has its greatest extent.
    pub fn longest_axis(&self) -> usize {
        let (x, y, z) = (self.size_x(), self.size_y(), self.size_z());

        if x >= y && x >= z {
            0
        } else if y >= z {
            1
        } else {
            2
        }
    }

    #[inline]
    pub fn surface_area(&self) -> f32 {
        let (dx, dy, dz) = (self.size_x(), self.size_y(), self.size_z());
        2.0 * (dx * dy + dy * dz + dz * dx)
    }

    #[inline]
    pub fn contains_point(&self, point: &Vec3f) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Grows `self` in place to also enclose `other`.
    #[inline]
    pub fn union_with(&mut self, other: &Aabb) -> &mut Self {
        self.min = min2(&self.min, &other.min);
        self.max = max2(&self.max, &other.max);
        self
    }

    /// Returns the tight bounding box of `self` and `other` without mutating either.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut result = *self;
        result.union_with(other);
        result
    }

    /// Union of a non-empty slice of boxes, indexed by `indices`.
    ///
    /// # Panics
    /// Panics if `indices` is empty.
    pub fn union_indexed(bvs: &[Aabb], indices: &[u32]) -> Aabb {
        let (first, rest) = indices
            .split_first()
            .expect("union_indexed requires at least one index");

        let mut result = bvs[*first as usize];

        for &i in rest {
            result.union_with(&bvs[i as usize]);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(min: (f32, f32, f32), max: (f32, f32, f32)) -> Aabb {
        Aabb::new(Vec3f::new(min.0, min.1, min.2), Vec3f::new(max.0, max.1, max.2))
    }

    #[test]
    fn union_grows_to_enclose_both() {
        let a = aabb((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        let b = aabb((0.5, -1.0, 0.5), (2.0, 0.5, 0.5));

        let u = a.union(&b);

        assert_eq!(*u.get_min(), Vec3f::new(0.0, -1.0, 0.0));
        assert_eq!(*u.get_max(), Vec3f::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn centroid_is_midpoint() {
        let a = aabb((0.0, 0.0, 0.0), (2.0, 4.0, 6.0));
        assert_eq!(a.centroid(), Vec3f::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn longest_axis_picks_greatest_extent() {
        assert_eq!(aabb((0.0, 0.0, 0.0), (5.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(aabb((0.0, 0.0, 0.0), (1.0, 5.0, 1.0)).longest_axis(), 1);
        assert_eq!(aabb((0.0, 0.0, 0.0), (1.0, 1.0, 5.0)).longest_axis(), 2);
        // Ties resolve to the lowest axis index.
        assert_eq!(aabb((0.0, 0.0, 0.0), (3.0, 3.0, 3.0)).longest_axis(), 0);
    }

    #[test]
    fn surface_area_of_unit_cube_is_six() {
        let cube = aabb((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        assert!((cube.surface_area() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn contains_point_respects_boundary() {
        let a = aabb((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        assert!(a.contains_point(&Vec3f::new(0.0, 0.5, 1.0)));
        assert!(!a.contains_point(&Vec3f::new(1.0001, 0.5, 0.5)));
    }

    #[test]
    fn union_indexed_matches_pairwise_union() {
        let bvs = [
            aabb((0.0, 0.0, 0.0), (1.0, 1.0, 1.0)),
            aabb((2.0, 2.0, 2.0), (3.0, 3.0, 3.0)),
            aabb((-1.0, 0.0, 0.0), (0.0, 1.0, 1.0)),
        ];

        let expected = bvs[0].union(&bvs[1]).union(&bvs[2]);
        let got = Aabb::union_indexed(&bvs, &[0, 1, 2]);

        assert_eq!(got, expected);
    }
}

//! Axis-aligned bounding boxes.

use crate::data_structures::instance::Instance;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Point3<f32>,
    pub max: cgmath::Point3<f32>,
}

impl Aabb {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Smallest box containing all `points`, `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Aabb::new(first, first);
        for p in points {
            aabb.grow(p);
        }
        Some(aabb)
    }

    pub fn grow(&mut self, p: [f32; 3]) {
        self.min.x = self.min.x.min(p[0]);
        self.min.y = self.min.y.min(p[1]);
        self.min.z = self.min.z.min(p[2]);
        self.max.x = self.max.x.max(p[0]);
        self.max.y = self.max.y.max(p[1]);
        self.max.z = self.max.z.max(p[2]);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.grow(other.min.into());
        out.grow(other.max.into());
        out
    }

    pub fn corners(&self) -> [[f32; 3]; 8] {
        let (a, b) = (self.min, self.max);
        [
            [a.x, a.y, a.z],
            [b.x, a.y, a.z],
            [b.x, b.y, a.z],
            [a.x, b.y, a.z],
            [a.x, a.y, b.z],
            [b.x, a.y, b.z],
            [b.x, b.y, b.z],
            [a.x, b.y, b.z],
        ]
    }

    /// World-space box enclosing this box after `transform`.
    pub fn transformed(&self, transform: &Instance) -> Aabb {
        let corners = self.corners().map(|c| transform.transform_point(c));
        let mut out = Aabb::new(corners[0], corners[0]);
        for c in &corners[1..] {
            out.grow(*c);
        }
        out
    }

    /// Touching faces count as overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Area of the ground-plane footprint shared with `other`; zero when the footprints only touch.
    pub fn overlap_area_xz(&self, other: &Aabb) -> f32 {
        let x = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let z = self.max.z.min(other.max.z) - self.min.z.max(other.min.z);
        x.max(0.0) * z.max(0.0)
    }

    pub fn size(&self) -> cgmath::Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> cgmath::Point3<f32> {
        cgmath::Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_symmetric_and_inclusive() {
        let a = Aabb::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb::new([1.0, 0.5, 0.5], [2.0, 2.0, 2.0]);
        let c = Aabb::new([1.01, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(a.intersects(&b) && b.intersects(&a));
        assert!(!a.intersects(&c) && !c.intersects(&a));
    }

    #[test]
    fn rotated_box_grows_its_footprint() {
        let unit = Aabb::new([-0.5, 0.0, -0.5], [0.5, 1.0, 0.5]);
        let turned = unit.transformed(
            &Instance::at(3.0, 0.0, 0.0).with_rotation_y(std::f32::consts::FRAC_PI_4),
        );
        let half_diagonal = 0.5 * 2f32.sqrt();
        assert!((turned.max.x - (3.0 + half_diagonal)).abs() < 1e-5);
        assert!((turned.min.z + half_diagonal).abs() < 1e-5);
        assert!((turned.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn from_points_of_nothing_is_none() {
        assert!(Aabb::from_points(Vec::<[f32; 3]>::new()).is_none());
        let b = Aabb::from_points([[1.0, 2.0, 3.0], [-1.0, 0.0, 5.0]]).unwrap();
        assert_eq!(b, Aabb::new([-1.0, 0.0, 3.0], [1.0, 2.0, 5.0]));
    }
}

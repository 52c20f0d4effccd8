//! Outlines, lathe curves and per-face texture regions.
//!
//! These are inputs to mesh construction only. A [`Profile`] is read while a
//! mesh is built and is not kept by the resulting template.

use cgmath::InnerSpace;

use crate::error::{Error, Result};

/// Points closer than this are the same point.
const POINT_EPSILON: f32 = 1e-6;

/// Ordered points of a 2D outline (in the x/z plane) or a lathe cross-section (in the x/y plane).
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    points: Vec<cgmath::Point3<f32>>,
}

impl Profile {
    pub fn new<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        Self {
            points: points.into_iter().map(cgmath::Point3::from).collect(),
        }
    }

    /// `sides` points on a circle of `radius` in the x/z plane, starting on +x.
    pub fn regular_polygon(sides: u32, radius: f32) -> Self {
        let step = std::f32::consts::TAU / sides.max(1) as f32;
        Self::new((0..sides).map(|i| {
            let angle = i as f32 * step;
            [radius * angle.cos(), 0.0, radius * angle.sin()]
        }))
    }

    pub fn points(&self) -> &[cgmath::Point3<f32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points that do not coincide with an earlier point.
    pub fn distinct_points(&self) -> usize {
        self.points
            .iter()
            .enumerate()
            .filter(|(i, p)| {
                !self.points[..*i]
                    .iter()
                    .any(|q| (*q - **p).magnitude2() <= POINT_EPSILON * POINT_EPSILON)
            })
            .count()
    }

    /// Fails with [`Error::DegenerateProfile`] when fewer than 3 distinct points are present.
    pub fn ensure_surface(&self, shape: &str) -> Result<()> {
        let distinct = self.distinct_points();
        if distinct < 3 {
            return Err(Error::DegenerateProfile {
                shape: shape.to_string(),
                points: distinct,
            });
        }
        Ok(())
    }

    /// Like [`Profile::ensure_surface`], and the closed x/z outline must also enclose an area.
    pub fn ensure_area_xz(&self, shape: &str) -> Result<()> {
        self.ensure_surface(shape)?;
        if self.signed_area_xz().abs() <= POINT_EPSILON {
            return Err(Error::DegenerateProfile {
                shape: shape.to_string(),
                points: self.distinct_points(),
            });
        }
        Ok(())
    }

    /// The outline projected onto the x/z plane.
    pub fn outline_xz(&self) -> Vec<[f32; 2]> {
        self.points.iter().map(|p| [p.x, p.z]).collect()
    }

    /// Twice the signed area of the closed x/z outline; positive when counter-clockwise
    /// seen from +y with x to the right and z downwards.
    pub fn signed_area_xz(&self) -> f32 {
        let outline = self.outline_xz();
        let n = outline.len();
        (0..n)
            .map(|i| {
                let a = outline[i];
                let b = outline[(i + 1) % n];
                a[0] * b[1] - b[0] * a[1]
            })
            .sum()
    }

    /// True when two non-adjacent edges of the closed x/z outline cross.
    pub fn self_intersects_xz(&self) -> bool {
        let outline = self.outline_xz();
        let n = outline.len();
        if n < 4 {
            return false;
        }
        for i in 0..n {
            let (a0, a1) = (outline[i], outline[(i + 1) % n]);
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                let (b0, b1) = (outline[j], outline[(j + 1) % n]);
                if segments_cross(a0, a1, b0, b1) {
                    return true;
                }
            }
        }
        false
    }

    /// Cumulative edge lengths along the closed x/z outline, starting at 0 and
    /// ending with the full perimeter.
    pub fn perimeter_stops_xz(&self) -> Vec<f32> {
        let outline = self.outline_xz();
        let n = outline.len();
        let mut stops = Vec::with_capacity(n + 1);
        let mut total = 0.0;
        stops.push(total);
        for i in 0..n {
            let (a, b) = (outline[i], outline[(i + 1) % n]);
            total += ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            stops.push(total);
        }
        stops
    }
}

fn orientation(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Proper crossings only; shared endpoints of touching edges do not count.
fn segments_cross(a0: [f32; 2], a1: [f32; 2], b0: [f32; 2], b1: [f32; 2]) -> bool {
    let d1 = orientation(b0, b1, a0);
    let d2 = orientation(b0, b1, a1);
    let d3 = orientation(a0, a1, b0);
    let d4 = orientation(a0, a1, b1);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// A rectangle in texture space: `(u0, v0)` to `(u1, v1)`.
///
/// Reversed corners are allowed and flip the texture on that face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);
    /// Used for faces that carry no texture region.
    pub const ORIGIN: UvRect = UvRect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Maps a normalized `(s, t)` in `[0, 1]²` into this rectangle.
    pub fn lerp(&self, s: f32, t: f32) -> [f32; 2] {
        [
            self.u0 + (self.u1 - self.u0) * s,
            self.v0 + (self.v1 - self.v0) * t,
        ]
    }
}

impl From<[f32; 4]> for UvRect {
    fn from(v: [f32; 4]) -> Self {
        UvRect::new(v[0], v[1], v[2], v[3])
    }
}

/// One texture region per logical face of a primitive, in the primitive's face order.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMapping {
    regions: Vec<UvRect>,
}

impl FaceMapping {
    pub fn new<I>(regions: I) -> Self
    where
        I: IntoIterator<Item = [f32; 4]>,
    {
        Self::from_rects(regions.into_iter().map(UvRect::from).collect())
    }

    pub fn from_rects(regions: Vec<UvRect>) -> Self {
        Self { regions }
    }

    /// `count` copies of the full texture.
    pub fn uniform(count: usize) -> Self {
        Self {
            regions: vec![UvRect::FULL; count],
        }
    }

    pub fn regions(&self) -> &[UvRect] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, face: usize) -> UvRect {
        self.regions.get(face).copied().unwrap_or(UvRect::FULL)
    }

    /// Fails with [`Error::FaceMappingMismatch`] unless exactly `expected` regions are present.
    pub fn expect_faces(&self, primitive: &'static str, expected: usize) -> Result<()> {
        if self.regions.len() != expected {
            return Err(Error::FaceMappingMismatch {
                primitive,
                expected,
                found: self.regions.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_three_points_is_degenerate() {
        let line = Profile::new([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(
            line.ensure_surface("line"),
            Err(Error::DegenerateProfile {
                shape: "line".into(),
                points: 2
            })
        );
        assert!(Profile::regular_polygon(3, 1.0).ensure_surface("tri").is_ok());
    }

    #[test]
    fn repeated_points_do_not_count_towards_a_surface() {
        let stacked = Profile::new([[0.5, 1.0, 0.0]; 3]);
        assert_eq!(stacked.distinct_points(), 1);
        assert_eq!(
            stacked.ensure_surface("vase"),
            Err(Error::DegenerateProfile {
                shape: "vase".into(),
                points: 1
            })
        );
    }

    #[test]
    fn collinear_outline_encloses_no_area() {
        let line = Profile::new([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert!(line.ensure_surface("line").is_ok());
        assert!(matches!(
            line.ensure_area_xz("line"),
            Err(Error::DegenerateProfile { points: 3, .. })
        ));
        assert!(Profile::regular_polygon(4, 1.0).ensure_area_xz("square").is_ok());
    }

    #[test]
    fn bow_tie_self_intersects_but_square_does_not() {
        let square = Profile::new([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ]);
        let bow_tie = Profile::new([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        assert!(!square.self_intersects_xz());
        assert!(bow_tie.self_intersects_xz());
        assert!((square.signed_area_xz() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn perimeter_stops_close_the_loop() {
        let square = Profile::new([
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 0.0, 2.0],
            [0.0, 0.0, 2.0],
        ]);
        assert_eq!(square.perimeter_stops_xz(), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn mapping_count_is_checked() {
        let mapping = FaceMapping::uniform(3);
        assert!(mapping.expect_faces("cylinder", 3).is_ok());
        assert!(matches!(
            mapping.expect_faces("box", 4),
            Err(Error::FaceMappingMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn reversed_rect_flips_coordinates() {
        let rect = UvRect::new(0.38, 1.0, 0.0, 0.5);
        assert_eq!(rect.lerp(0.0, 0.0), [0.38, 1.0]);
        assert_eq!(rect.lerp(1.0, 1.0), [0.0, 0.5]);
    }
}

//! Built-in shapes, texture layouts and placements of the village.
//!
//! Pure data. Everything here can be swapped for caller supplied values.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::{
    data_structures::profile::{FaceMapping, Profile},
    instancing::PlacementEntry,
};

pub const CAR_DEPTH: f32 = 0.2;
/// Points sampled along the car's nose.
pub const CAR_ARC_SAMPLES: usize = 20;

/// Closed car body outline in the x/z plane: a flat front edge, a 20-point
/// quarter-circle nose and a pointed rear taper back to the start.
pub fn car_outline() -> Profile {
    let flat = [[-0.3, 0.0, -0.1], [0.2, 0.0, -0.1]];
    let arc = (0..CAR_ARC_SAMPLES).map(|i| {
        let angle = i as f32 * PI / 40.0;
        [0.2 * angle.cos(), 0.0, 0.2 * angle.sin() - 0.1]
    });
    Profile::new(flat.into_iter().chain(arc))
}

/// Top, sides and bottom of the car body in the car texture atlas.
pub fn car_face_mapping() -> FaceMapping {
    FaceMapping::new([
        [0.0, 0.5, 0.38, 1.0],
        [0.0, 0.0, 1.0, 0.5],
        [0.38, 1.0, 0.0, 0.5],
    ])
}

/// Hub cap, tread and hub cap of the wheel texture.
pub fn wheel_face_mapping() -> FaceMapping {
    FaceMapping::new([
        [0.0, 0.0, 1.0, 1.0],
        [0.0, 0.5, 0.0, 0.5],
        [0.0, 0.0, 1.0, 1.0],
    ])
}

/// Rear, front, right and left walls in the four-column house texture.
pub fn house_face_mapping() -> FaceMapping {
    FaceMapping::new([
        [0.5, 0.0, 0.75, 1.0],
        [0.0, 0.0, 0.25, 1.0],
        [0.25, 0.0, 0.5, 1.0],
        [0.75, 0.0, 1.0, 1.0],
    ])
}

/// Basin cross-section (x = radius, y = height): floor, rim, inner wall, stem and spout.
pub fn fountain_profile() -> Profile {
    Profile::new([
        [0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0],
        [0.5, 0.2, 0.0],
        [0.4, 0.2, 0.0],
        [0.4, 0.05, 0.0],
        [0.05, 0.1, 0.0],
        [0.05, 0.8, 0.0],
        [0.15, 0.9, 0.0],
    ])
}

/// Hand-placed street of four houses.
pub fn fixed_house_placements() -> Vec<PlacementEntry> {
    vec![
        PlacementEntry::new(0.0, -6.8, 2.5),
        PlacementEntry::new(FRAC_PI_2, -4.5, 3.0),
        PlacementEntry::new(PI, -1.5, 4.0),
        PlacementEntry::new(-FRAC_PI_2, 1.5, 6.0),
    ]
}

//! Scene configuration.
//!
//! Every value defaults to the village as it was first laid out; callers
//! override individual fields with struct update syntax or the `with_*` setters.

use std::f32::consts::FRAC_PI_2;

use crate::{
    data_structures::profile::{FaceMapping, Profile},
    emission::EmitterConfig,
    geometry::library,
    instancing::PlacementPolicy,
};

const ASSETS: &str = "https://assets.babylonjs.com/environments";

#[derive(Clone, Debug)]
pub struct HouseOptions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub face_uv: FaceMapping,
    pub roof_diameter: f32,
    pub roof_height: f32,
    /// Sides of the roof cross-section; 3 gives a gable roof.
    pub roof_sides: u32,
    /// Horizontal squash of the roof before it is laid on its side.
    pub roof_scale_x: f32,
    /// Height of the roof's axis above the top of the walls. The eaves dip slightly below it.
    pub roof_elevation: f32,
    pub wall_texture: String,
    pub roof_texture: String,
}

impl Default for HouseOptions {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            face_uv: library::house_face_mapping(),
            roof_diameter: 1.5,
            roof_height: 1.25,
            roof_sides: 3,
            roof_scale_x: 0.75,
            roof_elevation: 0.25,
            wall_texture: format!("{ASSETS}/cubehouse.png"),
            roof_texture: format!("{ASSETS}/roof.jpg"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CarOptions {
    pub outline: Profile,
    pub face_uv: FaceMapping,
    pub depth: f32,
    pub body_texture: String,
    pub wheel_face_uv: FaceMapping,
    pub wheel_diameter: f32,
    pub wheel_width: f32,
    pub wheel_tessellation: u32,
    pub wheel_texture: String,
    pub wheel_rear_x: f32,
    pub wheel_front_x: f32,
    /// Axle height inside the outline plane.
    pub wheel_axle_z: f32,
    /// Distance between a wheel's centre and the nearest body face.
    pub wheel_gap: f32,
    /// Ground position of the whole car.
    pub position: [f32; 3],
    pub heading: f32,
    /// The outline is drawn lying down; this stands it upright.
    pub body_tilt_x: f32,
}

impl Default for CarOptions {
    fn default() -> Self {
        Self {
            outline: library::car_outline(),
            face_uv: library::car_face_mapping(),
            depth: library::CAR_DEPTH,
            body_texture: format!("{ASSETS}/car.png"),
            wheel_face_uv: library::wheel_face_mapping(),
            wheel_diameter: 0.125,
            wheel_width: 0.05,
            wheel_tessellation: 24,
            wheel_texture: format!("{ASSETS}/wheel.png"),
            wheel_rear_x: -0.2,
            wheel_front_x: 0.1,
            wheel_axle_z: -0.1,
            wheel_gap: 0.035,
            position: [3.0, 0.0, 8.0],
            heading: 0.0,
            body_tilt_x: -FRAC_PI_2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FountainOptions {
    pub profile: Profile,
    pub tessellation: u32,
    pub position: [f32; 3],
}

impl Default for FountainOptions {
    fn default() -> Self {
        Self {
            profile: library::fountain_profile(),
            tessellation: 64,
            position: [-4.0, 0.0, -6.0],
        }
    }
}

#[derive(Clone, Debug)]
pub struct GroundOptions {
    pub width: f32,
    pub height: f32,
    pub texture: String,
}

impl Default for GroundOptions {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 50.0,
            texture: "https://www.babylonjs-playground.com/textures/grass.png".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MoverOptions {
    /// Distance covered by one movement intent.
    pub step: f32,
}

impl Default for MoverOptions {
    fn default() -> Self {
        Self { step: 0.05 }
    }
}

#[derive(Clone, Debug)]
pub struct VillageConfig {
    pub house: HouseOptions,
    pub car: CarOptions,
    pub fountain: FountainOptions,
    pub ground: GroundOptions,
    pub emitter: EmitterConfig,
    pub mover: MoverOptions,
    pub placements: PlacementPolicy,
    pub house_prefix: String,
    /// Seed of the particle system's random stream.
    pub particle_seed: u64,
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            house: HouseOptions::default(),
            car: CarOptions::default(),
            fountain: FountainOptions::default(),
            ground: GroundOptions::default(),
            emitter: EmitterConfig::default(),
            mover: MoverOptions::default(),
            placements: PlacementPolicy::Fixed(library::fixed_house_placements()),
            house_prefix: "house".to_string(),
            particle_seed: 0,
        }
    }
}

impl VillageConfig {
    pub fn with_placements(mut self, placements: PlacementPolicy) -> Self {
        self.placements = placements;
        self
    }

    /// Four houses scattered over a 10 × 10 patch, reproducible through `seed`.
    pub fn with_random_houses(self, seed: u64) -> Self {
        self.with_placements(PlacementPolicy::Random {
            count: 4,
            extent: 10.0,
            seed,
        })
    }

    pub fn with_particle_seed(mut self, seed: u64) -> Self {
        self.particle_seed = seed;
        self
    }
}

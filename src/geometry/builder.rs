//! Compound meshes of the village: house, car body, wheel, fountain and ground.
//!
//! Builders are pure. A failed build returns the error and leaves nothing
//! behind; callers register the returned template themselves.

use std::f32::consts::FRAC_PI_2;

use crate::{
    config::{CarOptions, FountainOptions, GroundOptions, HouseOptions},
    data_structures::{
        instance::Instance,
        mesh::{Material, MeshTemplate},
        profile::{FaceMapping, Profile},
    },
    error::Result,
    geometry::{
        merge::merge_meshes,
        primitives::{
            create_box, create_cylinder, create_ground, create_lathe, extrude_polygon, BoxOptions,
            CylinderOptions, ExtrudeOptions, LatheOptions,
        },
    },
};

/// Scene node names of the four wheels, in [`wheel_offsets`] order.
pub const WHEEL_NAMES: [&str; 4] = ["wheelRB", "wheelRF", "wheelLB", "wheelLF"];

pub fn build_house() -> Result<MeshTemplate> {
    build_house_with(&HouseOptions::default())
}

/// Textured walls with a gable roof resting on top, merged with both materials kept.
pub fn build_house_with(options: &HouseOptions) -> Result<MeshTemplate> {
    let mut walls = create_box(
        "box",
        &BoxOptions {
            width: options.width,
            height: options.height,
            depth: options.depth,
            face_uv: Some(options.face_uv.clone()),
        },
        Material::textured("boxMat", &options.wall_texture),
    )?;
    walls.transform = Instance::at(0.0, options.height / 2.0, 0.0);

    let mut roof = create_cylinder(
        "roof",
        &CylinderOptions {
            diameter: options.roof_diameter,
            height: options.roof_height,
            tessellation: options.roof_sides,
            face_uv: None,
        },
        Material::textured("roofMat", &options.roof_texture),
    )?;
    let laid = Instance::new()
        .with_scale(options.roof_scale_x, 1.0, 1.0)
        .with_rotation_z(FRAC_PI_2);
    roof.transform = Instance {
        position: cgmath::Vector3::new(0.0, options.height + options.roof_elevation, 0.0),
        ..laid
    };

    let house = merge_meshes("house", &[walls, roof], true);
    log::info!(
        "built house: {} vertices, {} materials",
        house.vertex_count(),
        house.materials.len()
    );
    Ok(house)
}

/// Extrudes the closed `profile` by the car's depth with a wrapped side texture.
pub fn build_car_body(
    profile: &Profile,
    face_mapping: &FaceMapping,
    options: &CarOptions,
) -> Result<MeshTemplate> {
    let body = extrude_polygon(
        "car",
        &ExtrudeOptions {
            shape: profile.clone(),
            depth: options.depth,
            face_uv: Some(face_mapping.clone()),
            wrap: true,
        },
        Material::textured("carMat", &options.body_texture),
    )?;
    log::info!(
        "built car body from {} outline points ({} regions)",
        profile.len(),
        body.region_count()
    );
    Ok(body)
}

/// One wheel; the car draws it four times through [`wheel_offsets`].
pub fn build_wheel(face_mapping: &FaceMapping, options: &CarOptions) -> Result<MeshTemplate> {
    create_cylinder(
        "wheel",
        &CylinderOptions {
            diameter: options.wheel_diameter,
            height: options.wheel_width,
            tessellation: options.wheel_tessellation,
            face_uv: Some(face_mapping.clone()),
        },
        Material::textured("wheelMat", &options.wheel_texture),
    )
}

/// Wheel placements relative to the body: rear/front × right/left.
///
/// The body spans `y` in `[-depth, 0]`; left wheels mirror the right ones
/// across the middle of that span.
pub fn wheel_offsets(options: &CarOptions) -> [(&'static str, Instance); 4] {
    let middle = -options.depth / 2.0;
    let lateral = options.depth / 2.0 + options.wheel_gap;
    let (right, left) = (middle + lateral, middle - lateral);
    let z = options.wheel_axle_z;
    [
        (WHEEL_NAMES[0], Instance::at(options.wheel_rear_x, right, z)),
        (WHEEL_NAMES[1], Instance::at(options.wheel_front_x, right, z)),
        (WHEEL_NAMES[2], Instance::at(options.wheel_rear_x, left, z)),
        (WHEEL_NAMES[3], Instance::at(options.wheel_front_x, left, z)),
    ]
}

/// Lathes the basin profile into a double-sided surface.
pub fn build_fountain(profile: &Profile, options: &FountainOptions) -> Result<MeshTemplate> {
    let fountain = create_lathe(
        "fountain",
        &LatheOptions {
            shape: profile.clone(),
            tessellation: options.tessellation,
            double_sided: true,
        },
        Material::plain("fountainMat"),
    )?;
    log::info!("built fountain: {} triangles", fountain.triangle_count());
    Ok(fountain)
}

pub fn build_ground(options: &GroundOptions) -> MeshTemplate {
    create_ground(
        "ground",
        options.width,
        options.height,
        Material::textured("groundMat", &options.texture),
    )
}

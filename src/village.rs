//! Scene assembly.
//!
//! Builds every template, places it in the scene graph, instances the houses
//! and wires the fountain to pointer picks. A part whose build fails is
//! logged and left out; the rest of the village is still assembled.

use anyhow::Context as _;

use crate::{
    config::VillageConfig,
    context::{Fountain, Village, VillageContext},
    data_structures::{instance::Instance, scene_graph::NodeId},
    emission::ParticleSystem,
    geometry::builder::{
        build_car_body, build_fountain, build_ground, build_house_with, build_wheel, wheel_offsets,
    },
    movement::Mover,
};

/// Node names the assembled scene is addressed by.
pub const CAR_NODE: &str = "car";
pub const CAR_BODY_NODE: &str = "carBody";
pub const FOUNTAIN_NODE: &str = "fountain";
pub const GROUND_NODE: &str = "ground";
const HOUSE_TEMPLATE_NODE: &str = "house";

pub fn assemble(config: &VillageConfig) -> VillageContext {
    let mut village = Village::new();

    let ground = village.store.insert(build_ground(&config.ground));
    village.scene.add(GROUND_NODE, Instance::new(), Some(ground));

    if let Err(e) = add_houses(&mut village, config) {
        log::error!("leaving out the houses: {:#}", e);
    }
    match add_car(&mut village, config) {
        Ok(car) => village.mover = Some(Mover::new(car, &config.mover)),
        Err(e) => log::error!("leaving out the car: {:#}", e),
    }
    if let Err(e) = add_fountain(&mut village, config) {
        log::error!("leaving out the fountain: {:#}", e);
    }

    log::info!(
        "village assembled: {} templates, {} scene nodes, {} instances",
        village.store.len(),
        village.scene.len(),
        village.instances.len()
    );
    VillageContext::new(village)
}

/// Builds the house template and replaces it with one instance per placement.
fn add_houses(village: &mut Village, config: &VillageConfig) -> anyhow::Result<()> {
    let house = build_house_with(&config.house).context("building the house template")?;
    let house = village.store.insert(house);
    let node = village
        .scene
        .add(HOUSE_TEMPLATE_NODE, Instance::new(), Some(house));
    let placements = config.placements.generate();
    let instanced = village
        .instances
        .instantiate(
            &mut village.store,
            &mut village.scene,
            house,
            &placements,
            &config.house_prefix,
        )
        .context("instancing houses");
    if instanced.is_err() {
        village.scene.remove(node);
    }
    instanced?;
    village.refresh_collisions();
    Ok(())
}

fn add_fountain(village: &mut Village, config: &VillageConfig) -> anyhow::Result<()> {
    let fountain = build_fountain(&config.fountain.profile, &config.fountain)
        .context("building the fountain")?;
    let fountain = village.store.insert(fountain);
    let [x, y, z] = config.fountain.position;
    let basin = village
        .scene
        .add(FOUNTAIN_NODE, Instance::at(x, y, z), Some(fountain));
    village.fountains.push(Fountain::new(
        basin,
        ParticleSystem::new(
            config.emitter.clone(),
            config.fountain.position,
            config.particle_seed,
        ),
    ));
    Ok(())
}

/// Car root (ground position and heading) → upright body → four wheels.
fn add_car(village: &mut Village, config: &VillageConfig) -> anyhow::Result<NodeId> {
    let options = &config.car;
    let body = build_car_body(&options.outline, &options.face_uv, options)
        .context("building the car body")?;
    let wheel = build_wheel(&options.wheel_face_uv, options).context("building the wheel")?;
    let body = village.store.insert(body);
    let wheel = village.store.insert(wheel);

    let [x, y, z] = options.position;
    let scene = &mut village.scene;
    let car = scene.add(
        CAR_NODE,
        Instance::at(x, y, z).with_rotation_y(options.heading),
        None,
    );
    let body_node = scene
        .add_child(
            car,
            CAR_BODY_NODE,
            Instance::new().with_rotation_x(options.body_tilt_x),
            Some(body),
        )
        .context("attaching the car body")?;

    let [first, rest @ ..] = wheel_offsets(options);
    let first_wheel = scene
        .add_child(body_node, first.0, first.1, Some(wheel))
        .context("attaching the first wheel")?;
    for (name, offset) in rest {
        let clone = scene
            .clone_node(first_wheel, name)
            .context("cloning a wheel")?;
        scene.set_local_transform(clone, offset);
    }

    // rest the lowest point of the car on its ground position
    let mover = Mover::new(car, &config.mover);
    if let Some(bounds) = mover.bounds(&village.scene, &village.store) {
        if let Some(node) = village.scene.get_mut(body_node) {
            node.local.position.y += y - bounds.min.y;
        }
    }
    Ok(car)
}

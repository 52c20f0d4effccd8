use flow_village::{
    collision::check_collision,
    config::{CarOptions, FountainOptions},
    data_structures::{
        profile::Profile,
        scene_graph::SceneGraph,
        store::{TemplateState, TemplateStore},
    },
    emission::EmissionState,
    error::Error,
    events::PointerEvent,
    geometry::{
        builder::{build_car_body, build_fountain, build_house},
        library,
    },
    instancing::{InstancingManager, PlacementEntry, PlacementPolicy},
    village::FOUNTAIN_NODE,
};
use instant::Duration;

use crate::common::test_utils::{block, close, default_village, PickLog};

mod common;

#[test]
fn four_placements_become_house_0_to_house_3() {
    let mut store = TemplateStore::new();
    let mut scene = SceneGraph::new();
    let mut manager = InstancingManager::new();
    let house = store.insert(build_house().unwrap());
    scene.add("house", Default::default(), Some(house));

    let places = vec![
        PlacementEntry::new(0.0, -6.8, 2.5),
        PlacementEntry::new(0.5, -3.0, 4.0),
        PlacementEntry::new(1.0, 2.0, -1.0),
        PlacementEntry::new(2.0, 5.0, 5.0),
    ];
    let created = manager
        .instantiate(&mut store, &mut scene, house, &places, "house")
        .unwrap();

    let ids: Vec<_> = created.iter().map(|i| i.id.clone()).collect();
    assert_eq!(ids, vec!["house_0", "house_1", "house_2", "house_3"]);
    assert_eq!(store.state(house), Some(TemplateState::Consumed));
    assert!(scene.find("house").is_none());
    let first = manager.get("house_0").unwrap();
    assert!(close(first.transform.position.x, -6.8));
    assert!(close(first.transform.position.z, 2.5));
    assert!(close(first.world_bounds().unwrap().min.y, 0.0));

    let again = manager.instantiate(&mut store, &mut scene, house, &places, "again");
    assert_eq!(again.unwrap_err(), Error::StaleTemplate { template: house });
}

#[test]
fn car_body_from_22_points_has_three_regions() {
    let outline = library::car_outline();
    assert_eq!(outline.len(), 22);
    let body = build_car_body(&outline, &library::car_face_mapping(), &CarOptions::default())
        .unwrap();
    assert_eq!(body.submeshes.len(), 1);
    assert_eq!(body.region_count(), 3);
    assert!(close(body.local_bounds().unwrap().size().y, 0.2));
}

#[test]
fn degenerate_profiles_fail_without_side_effects() {
    let mut store = TemplateStore::new();
    let line = Profile::new([[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]]);
    let body = build_car_body(&line, &library::car_face_mapping(), &CarOptions::default());
    let fountain = build_fountain(&line, &FountainOptions::default());
    for result in [body, fountain] {
        match result {
            Err(Error::DegenerateProfile { points, .. }) => assert_eq!(points, 2),
            other => panic!("expected a degenerate profile, got {:?}", other.map(|t| t.name)),
        }
    }
    assert!(store.is_empty());
    assert!(store.consume(flow_village::data_structures::store::TemplateId(0)).is_err());
}

#[test]
fn default_village_registers_houses_and_retires_the_template() {
    let context = default_village();
    let village = &context.village;
    assert_eq!(village.instances.len(), 4);
    for i in 0..4 {
        assert!(village.instances.get(&format!("house_{i}")).is_some());
    }
    let house_template = village.instances.get("house_0").unwrap().template;
    assert!(!village.store.is_renderable(house_template));

    let batches = context.draw_list();
    let houses = batches.iter().find(|b| b.template == house_template).unwrap();
    assert_eq!(houses.amount(), 4);
}

#[test]
fn random_village_is_reproducible() {
    let config = flow_village::config::VillageConfig::default().with_random_houses(9);
    let a = flow_village::assemble(&config);
    let b = flow_village::assemble(&config);
    let positions = |c: &flow_village::VillageContext| {
        c.village
            .instances
            .instances()
            .iter()
            .map(|i| i.transform.position)
            .collect::<Vec<_>>()
    };
    assert_eq!(positions(&a), positions(&b));
    assert!(matches!(config.placements, PlacementPolicy::Random { count: 4, .. }));
}

#[test]
fn picking_the_basin_toggles_the_fountain() {
    let mut context = default_village();
    let basin = context.village.scene.find(FOUNTAIN_NODE).unwrap();
    let ground = context.village.scene.find("ground").unwrap();
    let state = |c: &flow_village::VillageContext| c.village.fountain_at(basin).unwrap().state();

    context.handle_pointer(PointerEvent::down(Some(ground)));
    assert_eq!(state(&context), EmissionState::Off);

    context.handle_pointer(PointerEvent::down(Some(basin)));
    assert_eq!(state(&context), EmissionState::On);
    assert!(context.tick(Duration::from_millis(100)) > 0);
    let in_flight = context.village.fountain_at(basin).unwrap().particles.alive();

    context.handle_pointer(PointerEvent::down(Some(basin)));
    assert_eq!(state(&context), EmissionState::Off);
    assert_eq!(context.tick(Duration::from_millis(1)), 0);
    let fountain = context.village.fountain_at(basin).unwrap();
    assert!(!fountain.particles.is_active());
    assert_eq!(fountain.particles.alive(), in_flight);
}

#[test]
fn pick_ids_from_the_draw_list_reach_the_right_fountain() {
    use flow_village::{context::Fountain, emission::ParticleSystem};

    let mut context = default_village();
    let basin = context.village.scene.find(FOUNTAIN_NODE).unwrap();
    let node = context.village.scene.get(basin).unwrap();
    let (template, local) = (node.template.unwrap(), node.local.clone());
    let twin = context
        .village
        .scene
        .add("fountain2", local.clone(), Some(template));
    context.village.fountains.push(Fountain::new(
        twin,
        ParticleSystem::new(Default::default(), [0.0; 3], 1),
    ));

    let pick_of = |c: &flow_village::VillageContext, node| {
        c.draw_list()
            .into_iter()
            .find(|b| b.template == template)
            .and_then(|b| {
                b.pick_ids
                    .into_iter()
                    .find(|id| c.village.picked_node(*id) == Some(node))
            })
            .unwrap()
    };
    let basin_pick = pick_of(&context, basin);
    let twin_pick = pick_of(&context, twin);
    assert_ne!(basin_pick, twin_pick);

    context.pointer_down_at(basin_pick);
    let state = |c: &flow_village::VillageContext, node| c.village.fountain_at(node).unwrap().state();
    assert_eq!(state(&context, basin), EmissionState::On);
    assert_eq!(state(&context, twin), EmissionState::Off);

    context.pointer_down_at(twin_pick);
    assert_eq!(state(&context, twin), EmissionState::On);

    // houses resolve to their instances and leave the fountains alone
    let house_template = context.village.instances.get("house_2").unwrap().template;
    let houses = context
        .draw_list()
        .into_iter()
        .find(|b| b.template == house_template)
        .unwrap();
    let ids: Vec<_> = houses
        .pick_ids
        .iter()
        .filter_map(|id| context.village.picked_instance(*id))
        .map(|i| i.id.clone())
        .collect();
    assert_eq!(ids, vec!["house_0", "house_1", "house_2", "house_3"]);
    context.pointer_down_at(houses.pick_ids[0]);
    assert_eq!(state(&context, basin), EmissionState::On);
}

#[test]
fn extra_pointer_subscriptions_can_be_removed() {
    use std::{cell::RefCell, rc::Rc};

    let mut context = default_village();
    let basin = context.village.scene.find(FOUNTAIN_NODE).unwrap();
    let log = Rc::new(RefCell::new(PickLog::default()));
    let seen = Rc::clone(&log);
    let id = context.subscribe_pointer(move |_, event| {
        seen.borrow_mut().record(event.picked == Some(basin));
    });

    context.handle_pointer(PointerEvent::down(Some(basin)));
    context.handle_pointer(PointerEvent::down(None));
    assert!(context.unsubscribe_pointer(id));
    context.handle_pointer(PointerEvent::down(Some(basin)));

    assert_eq!(log.borrow().presses, 2);
    assert_eq!(log.borrow().hits, 1);
}

#[test]
fn collision_is_symmetric_and_any_match() {
    let a = block("a", 0.0, 0.0);
    let b = block("b", 0.75, 0.25);
    let far = block("far", 9.0, 9.0);
    assert_eq!(
        check_collision(&a, std::slice::from_ref(&b)),
        check_collision(&b, std::slice::from_ref(&a))
    );
    assert!(check_collision(&a, &[b.clone(), far.clone()]));
    assert!(check_collision(&a, &[far.clone(), b]));
    assert!(!check_collision(&a, &[far]));
    assert!(!check_collision(&a, &[]));
}

#[test]
fn teardown_stops_emission_and_releases_geometry() {
    let mut context = default_village();
    let basin = context.village.scene.find(FOUNTAIN_NODE).unwrap();
    context.handle_pointer(PointerEvent::down(Some(basin)));
    context.tick(Duration::from_millis(100));

    context.teardown();
    assert!(context.is_torn_down());
    assert!(context.village.store.is_empty());
    assert!(context.village.instances.is_empty());
    assert!(context.village.fountains.is_empty());
    assert!(context.draw_list().is_empty());
    assert_eq!(context.subscription_count(), 0);
}

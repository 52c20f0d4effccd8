//! Instancing of templates at declared placements.
//!
//! The [`InstancingManager`] owns the registry of every [`EntityInstance`].
//! Instancing a template retires it: the template's own scene nodes are
//! removed and the store marks it consumed, while its geometry stays in the
//! store for the instances to draw.

use std::{collections::HashSet, f32::consts::TAU};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    data_structures::{
        bounds::Aabb,
        instance::Instance,
        scene_graph::SceneGraph,
        store::{TemplateId, TemplateState, TemplateStore},
    },
    error::{Error, Result},
};

/// One desired instance: a turn about the vertical axis and a ground position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementEntry {
    pub rotation_y: f32,
    pub x: f32,
    pub z: f32,
}

impl PlacementEntry {
    pub fn new(rotation_y: f32, x: f32, z: f32) -> Self {
        Self { rotation_y, x, z }
    }
}

/// Where placement entries come from.
#[derive(Clone, Debug, PartialEq)]
pub enum PlacementPolicy {
    Fixed(Vec<PlacementEntry>),
    /// `count` entries with x and z uniform in `[0, extent)` and a rotation
    /// uniform in `[0, 2π)`.
    Random { count: usize, extent: f32, seed: u64 },
}

impl PlacementPolicy {
    pub fn generate(&self) -> Vec<PlacementEntry> {
        match self {
            PlacementPolicy::Fixed(entries) => entries.clone(),
            PlacementPolicy::Random {
                count,
                extent,
                seed,
            } => {
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                let extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
                (0..*count)
                    .map(|_| {
                        let rotation_y = rng.gen_range(0.0..TAU);
                        let x = rng.r#gen::<f32>() * extent;
                        let z = rng.r#gen::<f32>() * extent;
                        PlacementEntry::new(rotation_y, x, z)
                    })
                    .collect()
            }
        }
    }
}

/// One positioned occurrence of a template's geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityInstance {
    pub id: String,
    pub template: TemplateId,
    pub transform: Instance,
    local_bounds: Option<Aabb>,
}

impl EntityInstance {
    pub fn new(id: &str, template: TemplateId, transform: Instance, local_bounds: Option<Aabb>) -> Self {
        Self {
            id: id.to_string(),
            template,
            transform,
            local_bounds,
        }
    }

    pub fn local_bounds(&self) -> Option<Aabb> {
        self.local_bounds
    }

    /// Bounds of the template geometry under the current transform.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.local_bounds.map(|b| b.transformed(&self.transform))
    }
}

#[derive(Debug, Default)]
pub struct InstancingManager {
    instances: Vec<EntityInstance>,
}

impl InstancingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `{prefix}_{i}` for every placement and retires `template`.
    ///
    /// Instances sit at the height the template was shown at. Nothing is
    /// registered or retired when an error is returned.
    pub fn instantiate(
        &mut self,
        store: &mut TemplateStore,
        scene: &mut SceneGraph,
        template: TemplateId,
        placements: &[PlacementEntry],
        prefix: &str,
    ) -> Result<Vec<EntityInstance>> {
        match store.state(template) {
            None => return Err(Error::UnknownTemplate { template }),
            Some(TemplateState::Consumed) => return Err(Error::StaleTemplate { template }),
            Some(TemplateState::Renderable) => {}
        }
        let mesh = store
            .get(template)
            .ok_or(Error::UnknownTemplate { template })?
            .clone();

        let taken: HashSet<&str> = self.instances.iter().map(|i| i.id.as_str()).collect();
        let ids: Vec<String> = (0..placements.len())
            .map(|i| format!("{prefix}_{i}"))
            .collect();
        if let Some(id) = ids.iter().find(|id| taken.contains(id.as_str())) {
            return Err(Error::DuplicateInstance { id: id.clone() });
        }

        let baseline = scene
            .nodes_with_template(template)
            .first()
            .and_then(|node| scene.world_transform(*node))
            .map(|world| world.position.y)
            .unwrap_or(mesh.transform.position.y);
        let local_bounds = mesh.local_bounds();

        let created: Vec<EntityInstance> = placements
            .iter()
            .zip(ids)
            .map(|(place, id)| {
                let transform =
                    Instance::at(place.x, baseline, place.z).with_rotation_y(place.rotation_y);
                log::debug!("instance '{}' of {} at ({}, {})", id, template, place.x, place.z);
                EntityInstance::new(&id, template, transform, local_bounds)
            })
            .collect();

        store.consume(template)?;
        let removed = scene.remove_template_nodes(template);
        log::info!(
            "instanced '{}' {} times, retired the template and {} scene node(s)",
            mesh.name,
            created.len(),
            removed
        );
        self.instances.extend(created.iter().cloned());
        Ok(created)
    }

    pub fn get(&self, id: &str) -> Option<&EntityInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut EntityInstance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub fn instances(&self) -> &[EntityInstance] {
        &self.instances
    }

    pub fn of_template(&self, template: TemplateId) -> impl Iterator<Item = &EntityInstance> {
        self.instances.iter().filter(move |i| i.template == template)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

//! Draw batching.
//!
//! The village is drawn with one instanced batch per template. A batch holds
//! the world transforms of every scene node that still draws the template
//! plus every registered instance of it, so a consumed template shows up only
//! through its instances.
//!
//! Every transform carries its own pick id. Scene nodes use their node id and
//! registered instances set the top bit over their registry index, so a pick
//! read back from the frame resolves to exactly one node or instance.
//!
//! # Key types
//!
//! - [`Instanced`] is one template with its per-instance transforms and pick ids
//! - [`PickTarget`] decodes a pick id
//! - [`collect_batches`] walks the scene graph and instance registry

use std::collections::BTreeMap;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        scene_graph::{NodeId, SceneGraph},
        store::{TemplateId, TemplateStore},
    },
    instancing::InstancingManager,
};

const INSTANCE_PICK_BIT: u32 = 1 << 31;

/// What a pick id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickTarget {
    Node(NodeId),
    /// Index into the instance registry.
    Instance(usize),
}

impl PickTarget {
    pub fn pick_id(self) -> u32 {
        match self {
            PickTarget::Node(id) => id.0 & !INSTANCE_PICK_BIT,
            PickTarget::Instance(index) => INSTANCE_PICK_BIT | (index as u32 & !INSTANCE_PICK_BIT),
        }
    }

    pub fn from_pick_id(pick_id: u32) -> Self {
        if pick_id & INSTANCE_PICK_BIT == 0 {
            PickTarget::Node(NodeId(pick_id))
        } else {
            PickTarget::Instance((pick_id & !INSTANCE_PICK_BIT) as usize)
        }
    }
}

/// One template drawn `amount()` times.
#[derive(Clone, Debug, PartialEq)]
pub struct Instanced {
    pub template: TemplateId,
    pub transforms: Vec<Instance>,
    /// Pick id written by the pick pass, one per transform.
    pub pick_ids: Vec<u32>,
}

impl Instanced {
    pub fn amount(&self) -> usize {
        self.transforms.len()
    }

    pub fn raw(&self) -> Vec<InstanceRaw> {
        self.transforms.iter().map(Instance::to_raw).collect()
    }

    fn push(&mut self, transform: Instance, target: PickTarget) {
        self.transforms.push(transform);
        self.pick_ids.push(target.pick_id());
    }
}

pub fn collect_batches(
    store: &TemplateStore,
    scene: &SceneGraph,
    instances: &InstancingManager,
) -> Vec<Instanced> {
    let mut batches: BTreeMap<TemplateId, Instanced> = BTreeMap::new();
    for (id, node) in scene.iter() {
        let Some(template) = node.template else {
            continue;
        };
        if !store.is_renderable(template) {
            log::warn!(
                "node '{}' still points at retired template {}; skipping it",
                node.name,
                template
            );
            continue;
        }
        if let Some(world) = scene.world_transform(id) {
            batch(&mut batches, template).push(world, PickTarget::Node(id));
        }
    }
    for (index, instance) in instances.instances().iter().enumerate() {
        if store.get(instance.template).is_some() {
            batch(&mut batches, instance.template)
                .push(instance.transform.clone(), PickTarget::Instance(index));
        }
    }
    batches.into_values().collect()
}

fn batch(batches: &mut BTreeMap<TemplateId, Instanced>, template: TemplateId) -> &mut Instanced {
    batches.entry(template).or_insert_with(|| Instanced {
        template,
        transforms: Vec::new(),
        pick_ids: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_structures::mesh::{Material, MeshTemplate, SubMesh},
        instancing::PlacementEntry,
    };

    fn template(name: &str) -> MeshTemplate {
        MeshTemplate::single(name, SubMesh::new(name), Material::plain(name))
    }

    #[test]
    fn consumed_templates_draw_only_their_instances() {
        let mut store = TemplateStore::new();
        let mut scene = SceneGraph::new();
        let mut instances = InstancingManager::new();
        let ground = store.insert(template("ground"));
        let house = store.insert(template("house"));
        scene.add("ground", Instance::new(), Some(ground));
        scene.add("house", Instance::new(), Some(house));

        let before = collect_batches(&store, &scene, &instances);
        assert_eq!(before.iter().map(Instanced::amount).collect::<Vec<_>>(), vec![1, 1]);

        let places = [
            PlacementEntry::new(0.0, 1.0, 1.0),
            PlacementEntry::new(0.0, 2.0, 2.0),
        ];
        instances
            .instantiate(&mut store, &mut scene, house, &places, "house")
            .unwrap();
        let after = collect_batches(&store, &scene, &instances);
        assert_eq!(after.len(), 2);
        assert_eq!(after[1].template, house);
        assert_eq!(after[1].amount(), 2);
        assert_eq!(after[1].raw().len(), 2);
        assert_eq!(
            after[1].pick_ids,
            vec![PickTarget::Instance(0).pick_id(), PickTarget::Instance(1).pick_id()]
        );
    }

    #[test]
    fn nodes_sharing_a_template_get_their_own_pick_ids() {
        let mut store = TemplateStore::new();
        let mut scene = SceneGraph::new();
        let basin = store.insert(template("basin"));
        let north = scene.add("north", Instance::at(0.0, 0.0, 5.0), Some(basin));
        let south = scene.add("south", Instance::at(0.0, 0.0, -5.0), Some(basin));

        let batches = collect_batches(&store, &scene, &InstancingManager::new());
        assert_eq!(batches.len(), 1);
        let mut targets: Vec<_> = batches[0]
            .pick_ids
            .iter()
            .map(|id| PickTarget::from_pick_id(*id))
            .collect();
        targets.sort_by_key(|t| t.pick_id());
        let mut expected = vec![PickTarget::Node(north), PickTarget::Node(south)];
        expected.sort_by_key(|t| t.pick_id());
        assert_eq!(targets, expected);
        assert_eq!(
            PickTarget::from_pick_id(PickTarget::Instance(7).pick_id()),
            PickTarget::Instance(7)
        );
    }
}

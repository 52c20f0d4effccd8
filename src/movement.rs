//! Collision-gated stepping of a movable scene subtree.

use cgmath::Vector3;
use winit::keyboard::KeyCode;

use crate::{
    collision::{BroadPhase, CollisionDetector},
    config::MoverOptions,
    data_structures::{
        bounds::Aabb,
        scene_graph::{NodeId, SceneGraph},
        store::TemplateStore,
    },
};

/// Overlap growth below this is rounding, not a step further in.
const OVERLAP_TOLERANCE: f32 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementIntent {
    Forward,
    Backward,
    Left,
    Right,
}

impl MovementIntent {
    /// WASD and the arrow keys.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Self::Forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Self::Backward),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Self::Left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Self::Right),
            _ => None,
        }
    }

    /// Direction in the mover's own frame; the nose points along +x.
    fn local_direction(self) -> Vector3<f32> {
        match self {
            Self::Forward => Vector3::unit_x(),
            Self::Backward => -Vector3::unit_x(),
            Self::Left => -Vector3::unit_z(),
            Self::Right => Vector3::unit_z(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The step would have overlapped a static instance and was undone.
    Blocked,
}

/// Moves the scene node `root` (and with it everything parented below it).
#[derive(Clone, Debug)]
pub struct Mover {
    root: NodeId,
    step: f32,
}

impl Mover {
    pub fn new(root: NodeId, options: &MoverOptions) -> Self {
        Self {
            root,
            step: options.step,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// World bounds of all geometry in the subtree.
    pub fn bounds(&self, scene: &SceneGraph, store: &TemplateStore) -> Option<Aabb> {
        scene
            .subtree(self.root)
            .into_iter()
            .filter_map(|id| {
                let template = store.get(scene.get(id)?.template?)?;
                let world = scene.world_transform(id)?;
                template.local_bounds().map(|b| b.transformed(&world))
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Takes one step and undoes it when it runs into a static instance.
    ///
    /// A step that starts clear is undone on any overlap. A step that starts
    /// overlapping is kept as long as the overlap does not grow, so a mover
    /// placed inside an instance can always back out.
    pub fn apply<B: BroadPhase>(
        &self,
        intent: MovementIntent,
        scene: &mut SceneGraph,
        store: &TemplateStore,
        detector: &CollisionDetector<B>,
    ) -> MoveOutcome {
        let start = self.bounds(scene, store);
        let was_colliding = start.is_some_and(|bounds| detector.collides(&bounds));
        let overlap_before = start.map_or(0.0, |bounds| detector.overlap_area(&bounds));

        let Some(node) = scene.get_mut(self.root) else {
            log::warn!("You tried to move missing node {:?}.", self.root);
            return MoveOutcome::Blocked;
        };
        let before = node.local.position;
        node.local.position += node.local.rotation * intent.local_direction() * self.step;

        let blocked = self.bounds(scene, store).is_some_and(|bounds| {
            detector.collides(&bounds)
                && (!was_colliding
                    || detector.overlap_area(&bounds) > overlap_before + OVERLAP_TOLERANCE)
        });
        if blocked {
            if let Some(node) = scene.get_mut(self.root) {
                node.local.position = before;
            }
            log::debug!("{:?} step of {:?} blocked", intent, self.root);
            MoveOutcome::Blocked
        } else {
            MoveOutcome::Moved
        }
    }
}

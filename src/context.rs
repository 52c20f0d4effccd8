//! The one explicit scene context.
//!
//! [`Village`] owns all scene state: templates, the scene graph, the instance
//! registry, the collision snapshot, the fountains and the movable car.
//! [`VillageContext`] adds the pointer subscriptions on top and is what the
//! frame loop talks to. Teardown stops every emitter, drops every
//! subscription and releases all geometry.

use instant::Duration;
use winit::keyboard::KeyCode;

use crate::{
    collision::{Collider, CollisionDetector},
    data_structures::{
        scene_graph::{NodeId, SceneGraph},
        store::TemplateStore,
    },
    emission::{EmissionState, EmissionToggle, ParticleSystem},
    events::{EventDispatcher, PointerEvent, PointerKind, SubscriptionId},
    instancing::{EntityInstance, InstancingManager},
    movement::{MoveOutcome, MovementIntent, Mover},
    render::{collect_batches, Instanced, PickTarget},
};

/// Installs `env_logger` natively and `console_log` in the browser. Safe to call twice.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("logger already initialized: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("logger already initialized: {}", e);
        }
    }
}

/// A fountain basin with its own latch and particle stream.
#[derive(Debug)]
pub struct Fountain {
    pub node: NodeId,
    pub toggle: EmissionToggle,
    pub particles: ParticleSystem,
}

impl Fountain {
    pub fn new(node: NodeId, particles: ParticleSystem) -> Self {
        Self {
            node,
            toggle: EmissionToggle::new(node),
            particles,
        }
    }

    pub fn state(&self) -> EmissionState {
        self.toggle.state()
    }
}

#[derive(Debug, Default)]
pub struct Village {
    pub store: TemplateStore,
    pub scene: SceneGraph,
    pub instances: InstancingManager,
    pub detector: CollisionDetector,
    pub fountains: Vec<Fountain>,
    pub mover: Option<Mover>,
}

impl Village {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a pick to every fountain; returns how many of them flipped.
    pub fn handle_pick(&mut self, picked: Option<NodeId>) -> usize {
        self.fountains
            .iter_mut()
            .filter_map(|f| f.toggle.handle_pick(picked, &mut f.particles))
            .count()
    }

    /// The scene node a pick id from [`Village::batches`] names, if it still exists.
    pub fn picked_node(&self, pick_id: u32) -> Option<NodeId> {
        match PickTarget::from_pick_id(pick_id) {
            PickTarget::Node(id) => self.scene.get(id).map(|_| id),
            PickTarget::Instance(_) => None,
        }
    }

    /// The registered instance a pick id from [`Village::batches`] names.
    pub fn picked_instance(&self, pick_id: u32) -> Option<&EntityInstance> {
        match PickTarget::from_pick_id(pick_id) {
            PickTarget::Instance(index) => self.instances.instances().get(index),
            PickTarget::Node(_) => None,
        }
    }

    /// Advances all particle systems.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        self.fountains
            .iter_mut()
            .map(|f| f.particles.tick(elapsed))
            .sum()
    }

    /// Re-reads instance bounds into the collision snapshot.
    pub fn refresh_collisions(&mut self) {
        self.detector.rebuild(self.instances.instances());
    }

    pub fn check_collision<C: Collider + ?Sized>(&self, mover: &C) -> bool {
        self.detector.collides(mover)
    }

    /// `None` when the village has nothing to move.
    pub fn move_mover(&mut self, intent: MovementIntent) -> Option<MoveOutcome> {
        let mover = self.mover.as_ref()?;
        Some(mover.apply(intent, &mut self.scene, &self.store, &self.detector))
    }

    pub fn fountain_at(&self, node: NodeId) -> Option<&Fountain> {
        self.fountains.iter().find(|f| f.node == node)
    }

    pub fn batches(&self) -> Vec<Instanced> {
        collect_batches(&self.store, &self.scene, &self.instances)
    }
}

#[derive(Debug, Default)]
pub struct VillageContext {
    pub village: Village,
    pointer: EventDispatcher<PointerEvent, Village>,
    subscriptions: Vec<SubscriptionId>,
    torn_down: bool,
}

impl VillageContext {
    /// Wraps `village` and routes pointer presses to its fountains.
    pub fn new(village: Village) -> Self {
        let mut context = Self {
            village,
            ..Default::default()
        };
        context.subscribe_pointer(|village: &mut Village, event: &PointerEvent| {
            if event.kind == PointerKind::Down {
                village.handle_pick(event.picked);
            }
        });
        context
    }

    pub fn subscribe_pointer<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut Village, &PointerEvent) + 'static,
    {
        let id = self.pointer.subscribe(handler);
        self.subscriptions.push(id);
        id
    }

    pub fn unsubscribe_pointer(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.retain(|s| *s != id);
        self.pointer.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.pointer.len()
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> usize {
        self.pointer.dispatch(&mut self.village, &event)
    }

    /// Dispatches a pointer press on whatever `pick_id` was read back from the pick pass.
    pub fn pointer_down_at(&mut self, pick_id: u32) -> usize {
        let picked = self.village.picked_node(pick_id);
        self.handle_pointer(PointerEvent::down(picked))
    }

    /// Maps a key press to one movement step.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<MoveOutcome> {
        let intent = MovementIntent::from_key(key)?;
        self.village.move_mover(intent)
    }

    pub fn tick(&mut self, elapsed: Duration) -> usize {
        self.village.tick(elapsed)
    }

    pub fn draw_list(&self) -> Vec<Instanced> {
        self.village.batches()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stops and clears every emitter, removes every subscription and drops all scene state.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        for fountain in self.village.fountains.iter_mut() {
            fountain.particles.stop();
            fountain.particles.clear();
        }
        for id in std::mem::take(&mut self.subscriptions) {
            self.pointer.unsubscribe(id);
        }
        self.pointer.clear();

        let village = &mut self.village;
        log::info!(
            "tearing down village: {} templates, {} nodes, {} instances, {} fountains",
            village.store.len(),
            village.scene.len(),
            village.instances.len(),
            village.fountains.len()
        );
        village.fountains.clear();
        village.mover = None;
        village.detector.clear();
        village.instances.clear();
        village.scene.clear();
        village.store.clear();
        self.torn_down = true;
    }
}

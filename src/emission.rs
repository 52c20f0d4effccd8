//! Fountain water: a CPU particle system and the pick-driven on/off latch.
//!
//! The particle system is advanced by the frame loop through
//! [`ParticleSystem::tick`]. Starting and stopping only decide whether new
//! particles are spawned; particles already in flight always live out their
//! lifetime.

use cgmath::{ElementWise, Vector3};
use instant::Duration;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data_structures::scene_graph::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    /// Additive; overlapping particles brighten each other.
    OneOne,
    Standard,
}

/// Static emitter setup. Lifetimes and velocities are in simulation time,
/// which advances by `update_speed` per 60 Hz frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterConfig {
    pub capacity: usize,
    /// Emitter height above the fountain's base.
    pub emitter_height: f32,
    pub min_emit_box: [f32; 3],
    pub max_emit_box: [f32; 3],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub color_dead: [f32; 4],
    pub min_size: f32,
    pub max_size: f32,
    pub min_lifetime: f32,
    pub max_lifetime: f32,
    /// Particles per unit of simulation time.
    pub emit_rate: f32,
    pub blend_mode: BlendMode,
    pub gravity: [f32; 3],
    pub direction1: [f32; 3],
    pub direction2: [f32; 3],
    pub min_emit_power: f32,
    pub max_emit_power: f32,
    pub update_speed: f32,
    pub texture: Option<String>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            capacity: 5000,
            emitter_height: 0.8,
            min_emit_box: [-0.01, 0.0, -0.01],
            max_emit_box: [0.01, 0.0, 0.01],
            color1: [0.7, 0.8, 1.0, 1.0],
            color2: [0.2, 0.5, 1.0, 1.0],
            color_dead: [0.0, 0.0, 0.2, 0.0],
            min_size: 0.01,
            max_size: 0.05,
            min_lifetime: 0.3,
            max_lifetime: 1.5,
            emit_rate: 1500.0,
            blend_mode: BlendMode::OneOne,
            gravity: [0.0, -9.81, 0.0],
            direction1: [-1.0, 8.0, 1.0],
            direction2: [1.0, 8.0, -1.0],
            min_emit_power: 0.2,
            max_emit_power: 0.6,
            update_speed: 0.01,
            texture: Some("https://www.babylonjs-playground.com/textures/flare.png".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub color: [f32; 4],
    color_step: [f32; 4],
    pub size: f32,
    pub age: f32,
    pub lifetime: f32,
}

#[derive(Debug)]
pub struct ParticleSystem {
    config: EmitterConfig,
    origin: Vector3<f32>,
    active: bool,
    particles: Vec<Particle>,
    /// Fractional particles carried over to the next tick.
    pending: f32,
    rng: ChaCha8Rng,
}

impl ParticleSystem {
    /// `base` is the fountain position; particles leave `emitter_height` above it.
    pub fn new(config: EmitterConfig, base: [f32; 3], seed: u64) -> Self {
        let origin = Vector3::from(base) + Vector3::new(0.0, config.emitter_height, 0.0);
        Self {
            particles: Vec::with_capacity(config.capacity),
            config,
            origin,
            active: false,
            pending: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.pending = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn origin(&self) -> Vector3<f32> {
        self.origin
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn alive(&self) -> usize {
        self.particles.len()
    }

    /// Advances by `elapsed` wall time; returns how many particles were spawned.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        let step = self.config.update_speed * elapsed.as_secs_f32() * 60.0;
        if step <= 0.0 {
            return 0;
        }

        let gravity = Vector3::from(self.config.gravity);
        self.particles.retain_mut(|p| {
            p.age += step;
            if p.age >= p.lifetime {
                return false;
            }
            p.position += p.direction * step;
            p.direction += gravity * step;
            for (c, s) in p.color.iter_mut().zip(p.color_step) {
                *c += s * step;
            }
            true
        });

        if !self.active {
            return 0;
        }
        self.pending += self.config.emit_rate * step;
        let wanted = self.pending.floor();
        self.pending -= wanted;
        let room = self.config.capacity.saturating_sub(self.particles.len());
        let count = (wanted as usize).min(room);
        for _ in 0..count {
            let particle = self.spawn();
            self.particles.push(particle);
        }
        count
    }

    /// Drops every particle, in flight or not.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.pending = 0.0;
    }

    fn spawn(&mut self) -> Particle {
        let c = &self.config;
        let rng = &mut self.rng;
        let offset = random_between3(rng, c.min_emit_box, c.max_emit_box);
        let power = random_between(rng, c.min_emit_power, c.max_emit_power);
        let direction = random_between3(rng, c.direction1, c.direction2) * power;
        let lifetime = random_between(rng, c.min_lifetime, c.max_lifetime).max(f32::EPSILON);
        let size = random_between(rng, c.min_size, c.max_size);
        let mix = rng.r#gen::<f32>();
        let mut color = [0.0; 4];
        let mut color_step = [0.0; 4];
        for i in 0..4 {
            color[i] = c.color1[i] + (c.color2[i] - c.color1[i]) * mix;
            color_step[i] = (c.color_dead[i] - color[i]) / lifetime;
        }
        Particle {
            position: self.origin + offset,
            direction,
            color,
            color_step,
            size,
            age: 0.0,
            lifetime,
        }
    }
}

fn random_between(rng: &mut ChaCha8Rng, a: f32, b: f32) -> f32 {
    a + (b - a) * rng.r#gen::<f32>()
}

fn random_between3(rng: &mut ChaCha8Rng, a: [f32; 3], b: [f32; 3]) -> Vector3<f32> {
    let t = Vector3::new(rng.r#gen::<f32>(), rng.r#gen::<f32>(), rng.r#gen::<f32>());
    let (a, b) = (Vector3::from(a), Vector3::from(b));
    a + (b - a).mul_element_wise(t)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmissionState {
    #[default]
    Off,
    On,
}

/// On/off latch of one fountain, flipped by picks on its basin.
#[derive(Clone, Debug)]
pub struct EmissionToggle {
    basin: NodeId,
    state: EmissionState,
}

impl EmissionToggle {
    pub fn new(basin: NodeId) -> Self {
        Self {
            basin,
            state: EmissionState::Off,
        }
    }

    pub fn basin(&self) -> NodeId {
        self.basin
    }

    pub fn state(&self) -> EmissionState {
        self.state
    }

    /// Flips the latch when `picked` is the basin and starts or stops
    /// `particles` to match. Returns the new state on a transition.
    pub fn handle_pick(
        &mut self,
        picked: Option<NodeId>,
        particles: &mut ParticleSystem,
    ) -> Option<EmissionState> {
        if picked != Some(self.basin) {
            return None;
        }
        self.state = match self.state {
            EmissionState::Off => {
                particles.start();
                EmissionState::On
            }
            EmissionState::On => {
                particles.stop();
                EmissionState::Off
            }
        };
        log::info!("fountain {:?} emission {:?}", self.basin, self.state);
        Some(self.state)
    }
}

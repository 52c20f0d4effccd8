//! flow-village
//!
//! The core of a small procedural village: parametric meshes built from
//! profiles and primitives, a house template instanced at declared
//! placements, collision checks that gate a movable car, and a fountain whose
//! particle stream is toggled by picking its basin. Everything runs on one
//! thread, driven by the caller's frame loop through a [`context::VillageContext`].
//!
//! High-level modules
//! - `data_structures`: transforms, bounds, profiles, meshes, template store and scene graph
//! - `geometry`: primitive builders, merging and the village's compound meshes
//! - `instancing`: placement policies and the instance registry
//! - `collision`: any-match overlap queries with a pluggable broad phase
//! - `movement`: key-driven, collision-gated stepping
//! - `emission`: particle system and the pick-driven emission latch
//! - `events`: pointer events and removable subscriptions
//! - `render`: per-template instanced draw batches
//! - `resources`: GPU upload of templates and instance transforms
//! - `context`: the explicit scene context, logger setup and teardown
//! - `config` / `village`: scene defaults and assembly
//!

pub mod collision;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod emission;
pub mod error;
pub mod events;
pub mod geometry;
pub mod instancing;
pub mod movement;
pub mod render;
pub mod resources;
pub mod village;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::{init_logger, Village, VillageContext};
pub use error::{Error, Result};
pub use village::assemble;
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

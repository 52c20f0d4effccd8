//! Scene data structures: transforms, bounds, profiles, meshes and the scene graph.
//!
//! - `instance` holds per-entity transformation data and its GPU layout
//! - `bounds` is the axis-aligned box used for placement and collision
//! - `profile` contains outlines, lathe curves and face texture mappings
//! - `mesh` contains CPU mesh templates with per-sub-mesh materials
//! - `store` owns built templates and tracks whether they are still drawn
//! - `scene_graph` enables hierarchical placement through parent ids

pub mod bounds;
pub mod instance;
pub mod mesh;
pub mod profile;
pub mod scene_graph;
pub mod store;

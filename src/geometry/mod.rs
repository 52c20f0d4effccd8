//! Mesh construction.
//!
//! - `primitives` builds boxes, cylinders, lathes, extrusions and planes
//! - `merge` combines templates, optionally keeping one material per part
//! - `library` holds the built-in outlines, texture layouts and placements
//! - `builder` assembles the village's compound meshes from the above

pub mod builder;
pub mod library;
pub mod merge;
pub mod primitives;

/**
 * This module contains all logic for moving built geometry onto the GPU.
 */
pub mod mesh;

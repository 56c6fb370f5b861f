//! Engine data structures: models, textures, the scene arena, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-node transformation data
//! - `scene_graph` is the arena-backed scene hierarchy and its traversals

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;

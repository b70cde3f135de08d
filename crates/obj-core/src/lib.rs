//! OBJ Viewer Core Data Structures
//!
//! This crate turns OBJ geometry and its MTL material libraries into a
//! renderer-ready indexed mesh:
//! - Mesh: deduplicated vertex buffer + u32 triangle index buffer
//! - MeshChunk: contiguous per-material draw ranges
//! - MaterialDefinition: diffuse color, shininess, optional diffuse map path
//!
//! Rendering, windowing and texture decoding are downstream concerns; this
//! crate only produces the mesh description they consume.

pub mod mesh;

pub use mesh::*;

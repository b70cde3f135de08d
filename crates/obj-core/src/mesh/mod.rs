//! Indexed mesh data model and OBJ loading entry points

mod face;
mod mtl;
mod normals;
mod obj;

use serde::{Deserialize, Serialize};

pub use mtl::MaterialDefinition;
pub use obj::{load_obj, load_obj_from_bytes, load_obj_with_unit};

/// Import scale unit applied to vertex positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImportUnit {
    /// Meters (no scaling)
    #[default]
    Meters,
    /// Millimeters (scale by 0.001)
    Millimeters,
    /// Centimeters (scale by 0.01)
    Centimeters,
    /// Inches (scale by 0.0254)
    Inches,
}

impl ImportUnit {
    pub fn scale_factor(&self) -> f32 {
        match self {
            ImportUnit::Meters => 1.0,
            ImportUnit::Millimeters => 0.001,
            ImportUnit::Centimeters => 0.01,
            ImportUnit::Inches => 0.0254,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImportUnit::Meters => "Meters",
            ImportUnit::Millimeters => "Millimeters",
            ImportUnit::Centimeters => "Centimeters",
            ImportUnit::Inches => "Inches",
        }
    }

    pub const ALL: &'static [ImportUnit] = &[
        ImportUnit::Meters,
        ImportUnit::Millimeters,
        ImportUnit::Centimeters,
        ImportUnit::Inches,
    ];
}

/// One renderer-ready vertex: position, normal, texture coordinate.
///
/// `#[repr(C)]` and `Pod` so a renderer can upload the vertex slice as raw
/// bytes. Normal and texture coordinate are zero when the source face corner
/// does not reference them.
#[repr(C)]
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// A contiguous run of the index buffer drawn with one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshChunk {
    /// First index of the run
    pub start_index: u32,
    /// Number of indices in the run (always a multiple of 3)
    pub index_count: u32,
    /// Material bound while drawing this run
    pub material: MaterialDefinition,
}

/// An indexed triangle mesh with per-material draw chunks
///
/// Chunks partition the index buffer without gaps or overlaps, in the order
/// materials were first activated in the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub chunks: Vec<MeshChunk>,
}

impl Mesh {
    /// Number of triangles in the index buffer
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounding box over all vertex positions
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];

        for vertex in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(vertex.position[i]);
                max[i] = max[i].max(vertex.position[i]);
            }
        }

        Some((min, max))
    }
}

/// Mesh-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Empty mesh: no drawable geometry found")]
    EmptyMesh,
}

//! OBJ mesh file loading
//!
//! Streams the source line by line into an explicit parse context, then
//! hands the caller an immutable [`Mesh`] snapshot. Malformed local records
//! (bad face corners, missing material files) degrade gracefully; only an
//! unreadable source or zero drawable geometry fail the load.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use super::face;
use super::mtl::{self, MaterialDefinition};
use super::normals::finalize_normals;
use super::{ImportUnit, Mesh, MeshChunk, MeshError, Vertex};

/// Load an OBJ file and build a renderer-ready indexed mesh
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, MeshError> {
    load_obj_with_unit(path, ImportUnit::Meters)
}

/// Load an OBJ file, scaling positions by the given import unit
pub fn load_obj_with_unit(path: impl AsRef<Path>, unit: ImportUnit) -> Result<Mesh, MeshError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| MeshError::Io(format!("unable to open OBJ file {}: {}", path.display(), e)))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    parse_obj(BufReader::new(file), base_dir, unit)
}

/// Parse OBJ source from an in-memory buffer.
///
/// `base_dir` anchors `mtllib` references, which are resolved and read from
/// the filesystem as usual.
pub fn load_obj_from_bytes(
    data: &[u8],
    base_dir: impl AsRef<Path>,
    unit: ImportUnit,
) -> Result<Mesh, MeshError> {
    parse_obj(Cursor::new(data), base_dir.as_ref(), unit)
}

fn parse_obj(reader: impl BufRead, base_dir: &Path, unit: ImportUnit) -> Result<Mesh, MeshError> {
    let mut parser = ObjParser::new(unit.scale_factor());

    for line in reader.lines() {
        let line = line.map_err(|e| MeshError::Io(format!("error reading OBJ source: {e}")))?;
        parser.dispatch_line(line.trim(), base_dir);
    }

    parser.finish()
}

/// Composite key identifying one unique combination of attribute indices.
/// Corners referencing the same triple share one emitted vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

/// Mutable parse state threaded through line dispatch.
///
/// Owns the attribute lists, the vertex deduplication cache and the open
/// chunk cursor for the duration of one parse; nothing outlives the call
/// except the returned mesh.
struct ObjParser {
    scale: f32,
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    library: HashMap<String, MaterialDefinition>,
    vertex_cache: HashMap<VertexKey, u32>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    chunks: Vec<MeshChunk>,
    /// Open chunk, appended to `chunks` when closed with a nonzero count
    chunk: MeshChunk,
    /// Name given by the most recent `usemtl` directive
    active_material: String,
}

impl ObjParser {
    fn new(scale: f32) -> Self {
        Self {
            scale,
            positions: Vec::new(),
            texcoords: Vec::new(),
            normals: Vec::new(),
            library: HashMap::new(),
            vertex_cache: HashMap::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            chunks: Vec::new(),
            chunk: MeshChunk {
                start_index: 0,
                index_count: 0,
                material: MaterialDefinition::fallback(),
            },
            active_material: String::new(),
        }
    }

    fn dispatch_line(&mut self, line: &str, base_dir: &Path) {
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            return;
        };

        match directive {
            "v" => {
                let [x, y, z] = read_floats(&mut tokens);
                self.positions
                    .push([x * self.scale, y * self.scale, z * self.scale]);
            }
            "vt" => {
                self.texcoords.push(read_floats(&mut tokens));
            }
            "vn" => {
                self.normals.push(read_floats(&mut tokens));
            }
            "mtllib" => {
                for file_name in tokens {
                    let path = mtl::normalize_path(&base_dir.join(file_name));
                    mtl::load_mtl(&path, &mut self.library);
                }
            }
            "usemtl" => {
                if let Some(name) = tokens.next() {
                    self.switch_material(name);
                }
            }
            "f" => self.face(tokens),
            _ => {}
        }
    }

    /// Handle a `usemtl` directive.
    ///
    /// Repeating the active name is a no-op. Otherwise the open chunk is
    /// closed if it has indices; an empty open chunk is recycled in place so
    /// consecutive switches never emit zero-count chunks.
    fn switch_material(&mut self, name: &str) {
        if name == self.active_material {
            return;
        }

        let cursor = self.indices.len() as u32;
        if self.chunk.index_count > 0 {
            let closed = std::mem::replace(
                &mut self.chunk,
                MeshChunk {
                    start_index: cursor,
                    index_count: 0,
                    material: MaterialDefinition::fallback(),
                },
            );
            self.chunks.push(closed);
        } else {
            self.chunk.start_index = cursor;
        }

        self.active_material = name.to_string();
        self.chunk.material = mtl::resolve_material(name, &self.library);
    }

    /// Handle a face record: resolve every corner through the dedup cache,
    /// then fan-triangulate into the index buffer.
    fn face<'a>(&mut self, tokens: impl Iterator<Item = &'a str>) {
        let corners: Vec<Option<u32>> = tokens.map(|token| self.emit_corner(token)).collect();
        if corners.len() < 3 {
            return;
        }

        face::fan_triangles(&corners, |triangle| {
            self.indices.extend_from_slice(&triangle);
            self.chunk.index_count += 3;
        });
    }

    /// Resolve one corner token to a vertex index.
    ///
    /// Identical attribute triples always return the same index; the first
    /// occurrence appends a vertex built from the referenced lists, with
    /// absent texcoord/normal defaulting to zero. Returns `None` when the
    /// mandatory position reference is invalid.
    fn emit_corner(&mut self, token: &str) -> Option<u32> {
        let corner = face::parse_corner(token)?;
        let Some(position) = face::resolve_index(corner.position, self.positions.len()) else {
            tracing::debug!("skipping face corner with invalid position reference '{token}'");
            return None;
        };

        let key = VertexKey {
            position,
            texcoord: face::resolve_index(corner.texcoord, self.texcoords.len()),
            normal: face::resolve_index(corner.normal, self.normals.len()),
        };

        if let Some(&index) = self.vertex_cache.get(&key) {
            return Some(index);
        }

        let mut vertex = Vertex {
            position: self.positions[position],
            ..Default::default()
        };
        if let Some(t) = key.texcoord {
            vertex.tex_coord = self.texcoords[t];
        }
        if let Some(n) = key.normal {
            vertex.normal = self.normals[n];
        }

        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        self.vertex_cache.insert(key, index);
        Some(index)
    }

    fn finish(mut self) -> Result<Mesh, MeshError> {
        if self.chunk.index_count > 0 {
            self.chunks.push(self.chunk);
        }

        finalize_normals(&mut self.vertices, &self.indices);

        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        Ok(Mesh {
            vertices: self.vertices,
            indices: self.indices,
            chunks: self.chunks,
        })
    }
}

/// Read up to N whitespace-separated floats, defaulting missing or
/// malformed components to zero
fn read_floats<'a, const N: usize>(tokens: &mut impl Iterator<Item = &'a str>) -> [f32; N] {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Mesh, MeshError> {
        load_obj_from_bytes(source.as_bytes(), "", ImportUnit::Meters)
    }

    const TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

    #[test]
    fn test_single_triangle_round_trip() {
        let mesh = parse(TRIANGLE).unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
        // No source normals, so the geometric face normal is synthesized.
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_quad_fans_into_two_triangles() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n").unwrap();
        // Corners 1 and 3 are shared between the two faces.
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_distinct_attribute_triples_are_not_merged() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
f 1/1 2/1 3/1
f 1/2 2/1 3/1
";
        let mesh = parse(source).unwrap();
        // Corner 1/2 differs from 1/1 in texcoord only, but still gets its
        // own vertex.
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn test_negative_indices_resolve_from_end() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_face_skipped_without_aborting() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 9
f 1 2 3
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(&mesh.indices[..], &[0, 1, 2]);
    }

    #[test]
    fn test_zero_index_is_invalid() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_empty_source_fails() {
        assert!(matches!(parse(""), Err(MeshError::EmptyMesh)));
        assert!(matches!(
            parse("# only comments\n# here\n"),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_vertices_without_faces_fail() {
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\n"),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_unreadable_file_fails() {
        let err = load_obj("definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
        assert!(err.to_string().contains("here.obj"));
    }

    #[test]
    fn test_repeated_usemtl_is_a_no_op() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl a
usemtl a
f 1 2 3
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.chunks.len(), 1);
        assert_eq!(mesh.chunks[0].start_index, 0);
        assert_eq!(mesh.chunks[0].index_count, 3);
    }

    #[test]
    fn test_material_switch_partitions_index_buffer() {
        let source = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
usemtl a
f 1 2 3
usemtl b
f 1 3 4
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.chunks.len(), 2);
        assert_eq!(mesh.chunks[0].start_index, 0);
        assert_eq!(mesh.chunks[0].index_count, 3);
        assert_eq!(mesh.chunks[1].start_index, 3);
        assert_eq!(mesh.chunks[1].index_count, 3);
        assert_eq!(
            (mesh.chunks[1].start_index + mesh.chunks[1].index_count) as usize,
            mesh.indices.len()
        );
    }

    #[test]
    fn test_consecutive_switches_emit_no_empty_chunk() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl a
usemtl b
f 1 2 3
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.chunks.len(), 1);
        assert_eq!(mesh.chunks[0].index_count, 3);
    }

    #[test]
    fn test_unresolvable_material_falls_back_to_default() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl missing
f 1 2 3
";
        let mesh = parse(source).unwrap();
        let material = &mesh.chunks[0].material;
        assert_eq!(material.name, "default");
        assert_eq!(material.diffuse_color, [0.8, 0.8, 0.8]);
        assert_eq!(material.shininess, 32.0);
        assert!(material.diffuse_texture.is_none());
    }

    #[test]
    fn test_faces_without_usemtl_use_default_material() {
        let mesh = parse(TRIANGLE).unwrap();
        assert_eq!(mesh.chunks.len(), 1);
        assert_eq!(mesh.chunks[0].material.name, "default");
    }

    #[test]
    fn test_supplied_normals_survive_and_are_renormalized() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 2 0
f 1//1 2//1 3//1
";
        let mesh = parse(source).unwrap();
        // The geometric face normal would be +Z; the supplied +Y wins.
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_texcoords_attached_to_vertices() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.25
f 1/1 2/1 3/1
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertices[0].tex_coord, [0.5, 0.25]);
    }

    #[test]
    fn test_import_unit_scales_positions() {
        let mesh = load_obj_from_bytes(TRIANGLE.as_bytes(), "", ImportUnit::Millimeters).unwrap();
        assert_eq!(mesh.vertices[1].position, [0.001, 0.0, 0.0]);
    }

    #[test]
    fn test_mtllib_and_usemtl_resolve_from_library() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scene.mtl"),
            "newmtl brick\nKd 0.6 0.2 0.1\nNs 8\nmap_Kd textures/brick.png\n",
        )
        .unwrap();

        let source = "\
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 0 1 0
usemtl brick
f 1 2 3
";
        let mesh = load_obj_from_bytes(source.as_bytes(), dir.path(), ImportUnit::Meters).unwrap();
        let material = &mesh.chunks[0].material;
        assert_eq!(material.name, "brick");
        assert_eq!(material.diffuse_color, [0.6, 0.2, 0.1]);
        assert_eq!(material.shininess, 8.0);
        assert_eq!(
            material.diffuse_texture.as_deref(),
            Some(dir.path().join("textures/brick.png").as_path())
        );
    }

    #[test]
    fn test_missing_mtllib_is_non_fatal() {
        let source = "\
mtllib nowhere.mtl
v 0 0 0
v 1 0 0
v 0 1 0
usemtl brick
f 1 2 3
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.chunks[0].material.name, "default");
    }

    #[test]
    fn test_load_obj_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let obj_path = dir.path().join("tri.obj");
        std::fs::write(&obj_path, TRIANGLE).unwrap();

        let mesh = load_obj(&obj_path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices.len(), 3);
    }
}

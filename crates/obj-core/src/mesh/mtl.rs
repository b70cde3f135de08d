//! MTL material library parsing

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One material definition from an MTL library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub name: String,
    /// Diffuse reflectance (`Kd`)
    pub diffuse_color: [f32; 3],
    /// Specular exponent (`Ns`)
    pub shininess: f32,
    /// Diffuse map path (`map_Kd`), resolved relative to the MTL file
    pub diffuse_texture: Option<PathBuf>,
}

impl MaterialDefinition {
    /// Create a definition with default shading parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_color: [0.8, 0.8, 0.8],
            shininess: 32.0,
            diffuse_texture: None,
        }
    }

    /// Material used when a `usemtl` name cannot be resolved
    pub fn fallback() -> Self {
        Self::new("default")
    }
}

/// Parse an MTL file and merge its definitions into `materials`.
///
/// An unreadable file is non-fatal: the map is left untouched and every
/// material referencing it falls back to defaults.
pub(crate) fn load_mtl(path: &Path, materials: &mut HashMap<String, MaterialDefinition>) {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("unable to open material library {}: {}", path.display(), e);
            return;
        }
    };

    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    parse_mtl(BufReader::new(file), &base_dir, materials);
}

/// Parse MTL source from a reader. Texture paths are resolved against
/// `base_dir` and lexically normalized.
pub(crate) fn parse_mtl(
    reader: impl BufRead,
    base_dir: &Path,
    materials: &mut HashMap<String, MaterialDefinition>,
) {
    let mut current: Option<MaterialDefinition> = None;

    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };

        match directive {
            "newmtl" => {
                if let Some(done) = current.take() {
                    materials.insert(done.name.clone(), done);
                }
                if let Some(name) = tokens.next() {
                    current = Some(MaterialDefinition::new(name));
                }
            }
            "Kd" => {
                if let Some(material) = current.as_mut() {
                    let rgb: Vec<f32> = tokens.take(3).filter_map(|t| t.parse().ok()).collect();
                    if let [r, g, b] = rgb[..] {
                        material.diffuse_color = [r, g, b];
                    }
                }
            }
            "Ns" => {
                if let Some(material) = current.as_mut() {
                    if let Some(value) = tokens.next().and_then(|t| t.parse().ok()) {
                        material.shininess = value;
                    }
                }
            }
            "map_Kd" => {
                if let Some(material) = current.as_mut() {
                    if let Some(file_name) = tokens.next() {
                        material.diffuse_texture = Some(normalize_path(&base_dir.join(file_name)));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(done) = current.take() {
        materials.insert(done.name.clone(), done);
    }
}

/// Look up a material by name, falling back to the default material
pub(crate) fn resolve_material(
    name: &str,
    library: &HashMap<String, MaterialDefinition>,
) -> MaterialDefinition {
    match library.get(name) {
        Some(material) => material.clone(),
        None => {
            tracing::warn!("material '{}' not found in library, using default", name);
            MaterialDefinition::fallback()
        }
    }
}

/// Lexically normalize a path (`a/b/../c` becomes `a/c`) without touching
/// the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

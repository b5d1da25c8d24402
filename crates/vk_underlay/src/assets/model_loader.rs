//! Text-format 3D model loader
//!
//! Parses the line-oriented `v`/`vn`/`vt`/`f` model format into a
//! deduplicated vertex/index representation, and provides the built-in cube
//! used as default geometry. The parser is deliberately best-effort:
//! malformed numeric tokens skip the line, and face references to missing or
//! out-of-range attributes fall back to defaults instead of failing the
//! whole load.

use crate::render::mesh::{Mesh, Vertex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors the model loader can report. Both are recoverable: the caller is
/// expected to log and fall back to the built-in cube.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// The file could not be opened or read
    #[error("cannot open model file {path}: {source}")]
    Io {
        /// Path of the file that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The file parsed but produced no geometry
    #[error("model file {path} contains no usable geometry")]
    NoVertices {
        /// Path of the offending file
        path: PathBuf,
    },
}

/// Default texture coordinate for face references without one
const DEFAULT_TEX_COORD: [f32; 2] = [0.0, 0.0];
/// Default normal for face references without one
const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Parses model files and synthesizes built-in geometry.
pub struct ModelLoader;

impl ModelLoader {
    /// Load a model file and return a deduplicated triangle mesh.
    ///
    /// Faces with more than three vertices are fan-triangulated around their
    /// first vertex. Assembled vertices are deduplicated by exact field
    /// equality against everything emitted so far.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Mesh, ModelLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();

        let mut vertices: Vec<Vertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|source| ModelLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens[0] {
                "v" => {
                    if let Some(p) = parse_vec3(&tokens) {
                        positions.push(p);
                    }
                }
                "vn" => {
                    if let Some(n) = parse_vec3(&tokens) {
                        normals.push(n);
                    }
                }
                "vt" => {
                    if tokens.len() >= 3 {
                        if let (Some(u), Some(v)) =
                            (parse_f32(tokens[1]), parse_f32(tokens[2]))
                        {
                            // The format stores v flipped relative to Vulkan.
                            tex_coords.push([u, 1.0 - v]);
                        }
                    }
                }
                "f" => {
                    process_face(
                        &tokens,
                        &positions,
                        &normals,
                        &tex_coords,
                        &mut vertices,
                        &mut indices,
                    );
                }
                _ => {}
            }
        }

        if vertices.is_empty() {
            return Err(ModelLoadError::NoVertices {
                path: path.to_path_buf(),
            });
        }

        log::debug!(
            "Loaded model {}: {} vertices, {} indices",
            path.display(),
            vertices.len(),
            indices.len()
        );

        Ok(Mesh::new(vertices, indices))
    }

    /// Built-in unit cube: 24 vertices (4 per face, flat per-face normals)
    /// and 36 indices. Vertices are not shared across faces because the
    /// normals differ per face. Always succeeds.
    pub fn built_in_cube() -> Mesh {
        // One entry per face: normal + the face's four corner positions,
        // wound counter-clockwise as seen from outside.
        const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
            (
                [0.0, 0.0, 1.0],
                [
                    [-1.0, -1.0, 1.0],
                    [1.0, -1.0, 1.0],
                    [1.0, 1.0, 1.0],
                    [-1.0, 1.0, 1.0],
                ],
            ),
            (
                [0.0, 0.0, -1.0],
                [
                    [1.0, -1.0, -1.0],
                    [-1.0, -1.0, -1.0],
                    [-1.0, 1.0, -1.0],
                    [1.0, 1.0, -1.0],
                ],
            ),
            (
                [-1.0, 0.0, 0.0],
                [
                    [-1.0, -1.0, -1.0],
                    [-1.0, -1.0, 1.0],
                    [-1.0, 1.0, 1.0],
                    [-1.0, 1.0, -1.0],
                ],
            ),
            (
                [1.0, 0.0, 0.0],
                [
                    [1.0, -1.0, 1.0],
                    [1.0, -1.0, -1.0],
                    [1.0, 1.0, -1.0],
                    [1.0, 1.0, 1.0],
                ],
            ),
            (
                [0.0, 1.0, 0.0],
                [
                    [-1.0, 1.0, 1.0],
                    [1.0, 1.0, 1.0],
                    [1.0, 1.0, -1.0],
                    [-1.0, 1.0, -1.0],
                ],
            ),
            (
                [0.0, -1.0, 0.0],
                [
                    [-1.0, -1.0, -1.0],
                    [1.0, -1.0, -1.0],
                    [1.0, -1.0, 1.0],
                    [-1.0, -1.0, 1.0],
                ],
            ),
        ];
        const FACE_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in &FACES {
            let base = vertices.len() as u32;
            for (corner, tex) in corners.iter().zip(FACE_TEX_COORDS.iter()) {
                vertices.push(Vertex::new(*corner, *normal, *tex));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Mesh::new(vertices, indices)
    }
}

fn parse_f32(token: &str) -> Option<f32> {
    token.parse::<f32>().ok()
}

fn parse_vec3(tokens: &[&str]) -> Option<[f32; 3]> {
    if tokens.len() < 4 {
        return None;
    }
    Some([
        parse_f32(tokens[1])?,
        parse_f32(tokens[2])?,
        parse_f32(tokens[3])?,
    ])
}

/// Resolve a 1-based attribute reference, treating malformed or out-of-range
/// values as missing.
fn lookup_attribute<T: Copy>(list: &[T], token: Option<&str>) -> Option<T> {
    let token = token.filter(|t| !t.is_empty())?;
    let index = token.parse::<i64>().ok()? - 1;
    usize::try_from(index).ok().and_then(|i| list.get(i)).copied()
}

/// Assemble one `f` line: resolve each `pos[/tex][/norm]` reference to a
/// deduplicated vertex index, then fan-triangulate around the first vertex.
fn process_face(
    tokens: &[&str],
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
) {
    if tokens.len() < 4 {
        return;
    }

    let mut face_indices: Vec<u32> = Vec::with_capacity(tokens.len() - 1);
    for reference in &tokens[1..] {
        let mut fields = reference.split('/');
        let position =
            lookup_attribute(positions, fields.next()).unwrap_or([0.0, 0.0, 0.0]);
        let tex_coord = lookup_attribute(tex_coords, fields.next()).unwrap_or(DEFAULT_TEX_COORD);
        let normal = lookup_attribute(normals, fields.next()).unwrap_or(DEFAULT_NORMAL);

        let vertex = Vertex::new(position, normal, tex_coord);
        face_indices.push(dedup_push(vertices, vertex));
    }

    for i in 1..face_indices.len() - 1 {
        indices.push(face_indices[0]);
        indices.push(face_indices[i]);
        indices.push(face_indices[i + 1]);
    }
}

/// Linear-scan deduplication: reuse the index of an exactly-equal vertex, or
/// append a new one. Quadratic in mesh size, which is fine at this scale.
fn dedup_push(vertices: &mut Vec<Vertex>, vertex: Vertex) -> u32 {
    if let Some(existing) = vertices.iter().position(|v| *v == vertex) {
        return existing as u32;
    }
    vertices.push(vertex);
    (vertices.len() - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("vk_underlay_{}_{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn quad_face_is_fan_triangulated() {
        let path = write_temp(
            "quad.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        let mesh = ModelLoader::load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertices.len(), 4);
        // Two triangles, both anchored at the first vertex.
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.is_valid());
    }

    #[test]
    fn repeated_references_are_deduplicated_across_faces() {
        // Both triangles reference vertex 1 and 3 with identical attributes.
        let path = write_temp(
            "dedup.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n",
        );
        let mesh = ModelLoader::load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.indices[0], mesh.indices[3]);
        assert_eq!(mesh.indices[2], mesh.indices[4]);
    }

    #[test]
    fn texture_v_coordinate_is_inverted() {
        let path = write_temp(
            "vt.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nvt 0.25 0.75\nf 1/1 2/1 3/1\n",
        );
        let mesh = ModelLoader::load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertices[0].tex_coord, [0.25, 0.25]);
    }

    #[test]
    fn out_of_range_attribute_references_use_defaults() {
        let path = write_temp(
            "oob.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1/9/9 2/9/9 3/9/9\n",
        );
        let mesh = ModelLoader::load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        for v in &mesh.vertices {
            assert_eq!(v.tex_coord, DEFAULT_TEX_COORD);
            assert_eq!(v.normal, DEFAULT_NORMAL);
        }
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = write_temp(
            "malformed.obj",
            "# comment\nv 0 0 zero\nv 0 0 0\nv 1 0 0\nv 1 1 0\nvt bad bad\nf 1 2 3\n",
        );
        let mesh = ModelLoader::load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // The malformed `v` and `vt` lines contribute nothing.
        assert_eq!(mesh.vertices.len(), 3);
        assert!(mesh.is_valid());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ModelLoader::load_model("no/such/model.obj").unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }

    #[test]
    fn geometry_free_file_is_rejected() {
        let path = write_temp("empty.obj", "# nothing here\n\n");
        let err = ModelLoader::load_model(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ModelLoadError::NoVertices { .. }));
    }

    #[test]
    fn built_in_cube_shape() {
        let cube = ModelLoader::built_in_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.is_valid());
    }

    #[test]
    fn cube_faces_share_one_axis_aligned_normal() {
        let cube = ModelLoader::built_in_cube();
        for face in cube.vertices.chunks(4) {
            let normal = face[0].normal;
            assert!(face.iter().all(|v| v.normal == normal));
            // Axis-aligned unit normal: one component is +-1, the rest 0.
            let ones = normal.iter().filter(|c| c.abs() == 1.0).count();
            let zeros = normal.iter().filter(|c| **c == 0.0).count();
            assert_eq!((ones, zeros), (1, 2));
        }
    }

    #[test]
    fn cube_corners_are_not_shared_across_faces() {
        let cube = ModelLoader::built_in_cube();
        // The corner (-1,-1,1) appears on three faces; each carries a
        // different normal, so all three entries must be distinct.
        let matches: Vec<&Vertex> = cube
            .vertices
            .iter()
            .filter(|v| v.position == [-1.0, -1.0, 1.0])
            .collect();
        assert_eq!(matches.len(), 3);
        assert_ne!(matches[0].normal, matches[1].normal);
        assert_ne!(matches[1].normal, matches[2].normal);
        assert_ne!(matches[0].normal, matches[2].normal);
    }
}

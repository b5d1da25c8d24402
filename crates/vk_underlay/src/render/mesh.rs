//! Mesh and vertex data for the underlay layers
//!
//! Pure geometry containers with no Vulkan dependency; the Vulkan-side
//! vertex input descriptions live in `render::vulkan::vertex_layout`.

/// A single vertex: position, normal, texture coordinate.
///
/// Equality is exact per-component float comparison; the model loader relies
/// on this for vertex deduplication.
///
/// `#[repr(C)]` keeps the memory layout stable for GPU buffer uploads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Triangle-list geometry: unique vertices plus 32-bit indices into them.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data, three entries per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Check the triangle-list invariants: non-empty, every index in range,
    /// index count divisible by three.
    pub fn is_valid(&self) -> bool {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return false;
        }
        if self.indices.len() % 3 != 0 {
            return false;
        }
        let count = self.vertices.len() as u32;
        self.indices.iter().all(|&i| i < count)
    }

    /// Number of indices, as the draw call wants it
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_equality_is_exact() {
        let a = Vertex::new([0.0, 1.0, 2.0], [0.0, 0.0, 1.0], [0.5, 0.5]);
        let b = Vertex::new([0.0, 1.0, 2.0], [0.0, 0.0, 1.0], [0.5, 0.5]);
        let c = Vertex::new([0.0, 1.0, 2.0 + f32::EPSILON], [0.0, 0.0, 1.0], [0.5, 0.5]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn validity_rejects_out_of_range_indices() {
        let v = vec![Vertex::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2]); 3];
        assert!(Mesh::new(v.clone(), vec![0, 1, 2]).is_valid());
        assert!(!Mesh::new(v.clone(), vec![0, 1, 3]).is_valid());
        assert!(!Mesh::new(v, vec![0, 1]).is_valid());
        assert!(!Mesh::new(Vec::new(), Vec::new()).is_valid());
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }
}

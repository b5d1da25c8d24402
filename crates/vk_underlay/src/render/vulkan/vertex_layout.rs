//! Vulkan vertex input descriptions
//!
//! Keeps the backend-specific layout data out of the geometry types; the
//! pipeline builder consumes these when assembling vertex input state.

use crate::render::mesh::Vertex;
use ash::vk;

/// Vertex input layout for the mesh layer's [`Vertex`]
pub struct VulkanVertexLayout;

impl VulkanVertexLayout {
    /// Binding description: one tightly packed vertex stream
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Attribute descriptions: position (location 0), normal (location 1),
    /// texture coordinate (location 2)
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_offsets_match_struct_layout() {
        let attrs = VulkanVertexLayout::attribute_descriptions();
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12); // after [f32; 3] position
        assert_eq!(attrs[2].offset, 24); // after position + normal
        assert_eq!(
            VulkanVertexLayout::binding_description().stride,
            std::mem::size_of::<Vertex>() as u32
        );
    }
}

//! Vulkan resource wrappers
//!
//! RAII ownership for every GPU object the underlay creates. The host owns
//! the instance, device and render pass; everything in here is created from
//! borrowed handles and destroyed in reverse creation order on drop.

pub mod buffer;
pub mod descriptor;
pub mod memory;
pub mod pipeline;
pub mod shader;
pub mod texture;
pub mod uniform;
pub mod vertex_layout;

use ash::vk;
use thiserror::Error;

/// Errors from Vulkan object creation and the texture layout state machine.
///
/// Resource-creation failures are unrecoverable for the engine: a partially
/// initialized pipeline cannot safely render, so the frame sequencer aborts
/// the process when one reaches it.
#[derive(Error, Debug)]
pub enum VulkanError {
    /// A raw Vulkan API call failed
    #[error("Vulkan API error: {0}")]
    Api(vk::Result),

    /// No memory type satisfies the requested bitmask and property flags
    #[error("no suitable memory type (type bits {type_bits:#x}, required flags {required:?})")]
    NoSuitableMemoryType {
        /// Memory type bitmask from the resource's requirements
        type_bits: u32,
        /// Property flags the allocation needs
        required: vk::MemoryPropertyFlags,
    },

    /// The texture pipeline was asked for a layout transition it does not
    /// implement
    #[error("unsupported image layout transition: {old:?} -> {new:?}")]
    UnsupportedLayoutTransition {
        /// Current layout
        old: vk::ImageLayout,
        /// Requested layout
        new: vk::ImageLayout,
    },

    /// Initialization failed for a reason other than a raw API error
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
}

/// Result alias used throughout the Vulkan wrappers
pub type VulkanResult<T> = Result<T, VulkanError>;

pub use buffer::{Buffer, GeometryBuffers};
pub use descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder};
pub use memory::{align_up, select_memory_type};
pub use pipeline::{DepthMode, GraphicsPipeline, PipelineCache};
pub use shader::ShaderModule;
pub use texture::Texture;
pub use uniform::{SceneUniforms, UniformRing, MAX_FRAMES_IN_FLIGHT, SCENE_UNIFORM_SIZE};
pub use vertex_layout::VulkanVertexLayout;

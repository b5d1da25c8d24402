//! Shader module wrapper
//!
//! Shader bytecode comes precompiled from the host asset system; modules are
//! short-lived and destroyed right after pipeline creation.

use crate::render::vulkan::{VulkanError, VulkanResult};
use ash::{vk, Device};

/// SPIR-V shader module with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V bytecode.
    pub fn from_bytes(device: Device, bytes: &[u8]) -> VulkanResult<Self> {
        // SPIR-V words are u32; reject blobs that are not word-aligned.
        let (prefix, words, suffix) = unsafe { bytes.align_to::<u32>() };
        if !prefix.is_empty() || !suffix.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "SPIR-V bytecode is not u32-aligned".to_string(),
            ));
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);
        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Get the module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

//! Descriptor set layout, pool and allocation

use crate::render::vulkan::{VulkanError, VulkanResult};
use ash::{vk, Device};

/// Builder for descriptor set layouts
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a dynamic uniform buffer binding
    pub fn add_dynamic_uniform_buffer(
        mut self,
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Add a combined image sampler binding
    pub fn add_combined_image_sampler(
        mut self,
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Build the layout
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);
        let layout = unsafe {
            device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(DescriptorSetLayout {
            device: device.clone(),
            layout,
        })
    }
}

impl Default for DescriptorSetLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor set layout with RAII cleanup
pub struct DescriptorSetLayout {
    device: Device,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Get the layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor pool sized for one underlay layer: one dynamic uniform buffer
/// plus one combined image sampler, one set.
pub struct DescriptorPool {
    device: Device,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Create the pool
    pub fn new(device: Device) -> VulkanResult<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
                .descriptor_count(1)
                .build(),
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .build(),
        ];

        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(1)
            .pool_sizes(&pool_sizes);

        let pool = unsafe {
            device
                .create_descriptor_pool(&pool_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, pool })
    }

    /// Allocate the layer's single descriptor set. The set is freed with the
    /// pool; it has no Drop of its own.
    pub fn allocate_set(&self, layout: &DescriptorSetLayout) -> VulkanResult<vk::DescriptorSet> {
        let layouts = [layout.handle()];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)?
        };
        Ok(sets[0])
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

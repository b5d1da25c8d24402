//! Graphics pipeline construction
//!
//! Fixed-function state is identical for both layers except for depth
//! handling: the opaque foreground writes depth and tests with `LESS`, the
//! background leaves depth untouched and tests with `LESS_OR_EQUAL` so it
//! never occludes the foreground drawn after it. Viewport and scissor are
//! dynamic; everything else is baked.

use crate::render::vulkan::{ShaderModule, VulkanError, VulkanResult};
use ash::{vk, Device};

/// Pipeline cache with RAII cleanup
pub struct PipelineCache {
    device: Device,
    cache: vk::PipelineCache,
}

impl PipelineCache {
    /// Create an empty cache
    pub fn new(device: Device) -> VulkanResult<Self> {
        let cache_info = vk::PipelineCacheCreateInfo::builder();
        let cache = unsafe {
            device
                .create_pipeline_cache(&cache_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self { device, cache })
    }

    /// Get the cache handle
    pub fn handle(&self) -> vk::PipelineCache {
        self.cache
    }
}

impl Drop for PipelineCache {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_cache(self.cache, None);
        }
    }
}

/// Depth state variant for a layer's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// Foreground geometry: depth write enabled, compare `LESS`
    Opaque,
    /// Background quad: depth write disabled, compare `LESS_OR_EQUAL`
    Background,
}

/// Graphics pipeline plus its layout, with RAII cleanup
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Build the pipeline. Shader modules are created from the supplied
    /// SPIR-V blobs and destroyed again as soon as the pipeline exists.
    pub fn new(
        device: Device,
        cache: &PipelineCache,
        render_pass: vk::RenderPass,
        set_layout: vk::DescriptorSetLayout,
        vertex_spirv: &[u8],
        fragment_spirv: &[u8],
        vertex_bindings: &[vk::VertexInputBindingDescription],
        vertex_attributes: &[vk::VertexInputAttributeDescription],
        depth_mode: DepthMode,
    ) -> VulkanResult<Self> {
        let vertex_shader = ShaderModule::from_bytes(device.clone(), vertex_spirv)?;
        let fragment_shader = ShaderModule::from_bytes(device.clone(), fragment_spirv)?;

        let set_layouts = [set_layout];
        let layout_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(&set_layouts);
        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let entry_point = std::ffi::CStr::from_bytes_with_nul(b"main\0")
            .map_err(|_| VulkanError::InitializationFailed("bad entry point".to_string()))?;
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_shader.handle())
                .name(entry_point)
                .build(),
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_shader.handle())
                .name(entry_point)
                .build(),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(vertex_bindings)
            .vertex_attribute_descriptions(vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Counts only; the actual viewport and scissor are dynamic.
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let (depth_write, depth_compare) = match depth_mode {
            DepthMode::Opaque => (true, vk::CompareOp::LESS),
            DepthMode::Background => (false, vk::CompareOp::LESS_OR_EQUAL),
        };
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(depth_write)
            .depth_compare_op(depth_compare)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            match device.create_graphics_pipelines(cache.handle(), &[pipeline_info.build()], None)
            {
                Ok(pipelines) => pipelines,
                Err((_, err)) => {
                    device.destroy_pipeline_layout(layout, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        // vertex_shader / fragment_shader drop here, destroying the modules.
        Ok(Self {
            device,
            pipeline: pipelines[0],
            layout,
        })
    }

    /// Get the pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get the pipeline layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

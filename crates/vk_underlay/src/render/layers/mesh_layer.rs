//! Foreground mesh layer
//!
//! Owns the geometry buffers, texture, uniform ring, descriptor set and
//! opaque pipeline for the textured mesh, and records its single indexed
//! draw. Geometry is recreated wholesale whenever the source mesh changes.

use crate::assets::ImageData;
use crate::render::host::HostDeviceContext;
use crate::render::mesh::Mesh;
use crate::render::vulkan::{
    DepthMode, DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, GeometryBuffers,
    GraphicsPipeline, PipelineCache, SceneUniforms, Texture, UniformRing, VulkanResult,
    VulkanVertexLayout,
};
use ash::{vk, Device};

/// The textured mesh layer
pub struct MeshLayer {
    // Field order is reverse creation order so drop unwinds creation.
    pipeline: GraphicsPipeline,
    #[allow(dead_code)]
    pipeline_cache: PipelineCache,
    descriptor_set: vk::DescriptorSet,
    #[allow(dead_code)]
    descriptor_pool: DescriptorPool,
    #[allow(dead_code)]
    set_layout: DescriptorSetLayout,
    uniforms: UniformRing,
    #[allow(dead_code)]
    texture: Texture,
    geometry: Option<GeometryBuffers>,
    device: Device,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
}

impl MeshLayer {
    /// Create the layer and record the texture upload into `command_buffer`.
    pub fn new(
        ctx: &HostDeviceContext,
        command_buffer: vk::CommandBuffer,
        min_uniform_alignment: vk::DeviceSize,
        vertex_spirv: &[u8],
        fragment_spirv: &[u8],
        pixels: &ImageData,
        mesh: &Mesh,
    ) -> VulkanResult<Self> {
        let device = ctx.device.clone();
        let memory_properties = unsafe {
            ctx.instance
                .get_physical_device_memory_properties(ctx.physical_device)
        };

        let texture = Texture::upload(&device, &memory_properties, command_buffer, pixels)?;
        let geometry = GeometryBuffers::new(&device, &memory_properties, mesh)?;
        let uniforms = UniformRing::new(
            device.clone(),
            &memory_properties,
            min_uniform_alignment,
            ctx.frames_in_flight,
        )?;

        let set_layout = DescriptorSetLayoutBuilder::new()
            .add_dynamic_uniform_buffer(0, vk::ShaderStageFlags::VERTEX)
            .add_combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT)
            .build(&device)?;
        let descriptor_pool = DescriptorPool::new(device.clone())?;
        let descriptor_set = descriptor_pool.allocate_set(&set_layout)?;
        write_layer_descriptors(&device, descriptor_set, &uniforms, &texture);

        let pipeline_cache = PipelineCache::new(device.clone())?;
        let bindings = [VulkanVertexLayout::binding_description()];
        let attributes = VulkanVertexLayout::attribute_descriptions();
        let pipeline = GraphicsPipeline::new(
            device.clone(),
            &pipeline_cache,
            ctx.render_pass,
            set_layout.handle(),
            vertex_spirv,
            fragment_spirv,
            &bindings,
            &attributes,
            DepthMode::Opaque,
        )?;

        log::debug!(
            "Mesh layer initialized: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        Ok(Self {
            pipeline,
            pipeline_cache,
            descriptor_set,
            descriptor_pool,
            set_layout,
            uniforms,
            texture,
            geometry: Some(geometry),
            device,
            memory_properties,
        })
    }

    /// Swap in new geometry: the old vertex/index pair is destroyed first,
    /// then replacements sized exactly to the mesh are created. Indices stay
    /// 32-bit regardless of mesh size.
    pub fn recreate_geometry(&mut self, mesh: &Mesh) -> VulkanResult<()> {
        self.geometry = None;
        self.geometry = Some(GeometryBuffers::new(
            &self.device,
            &self.memory_properties,
            mesh,
        )?);
        log::debug!(
            "Geometry buffers recreated: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(())
    }

    /// Write this frame's uniform slot
    pub fn update_slot(&self, slot: u32, uniforms: &SceneUniforms) -> VulkanResult<()> {
        self.uniforms.write_slot(slot, uniforms)
    }

    /// Record the layer's draw into `command_buffer`
    pub fn record(&self, command_buffer: vk::CommandBuffer, slot: u32, extent: vk::Extent2D) {
        let Some(geometry) = &self.geometry else {
            return;
        };

        unsafe {
            self.device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.handle(),
            );
            self.device.cmd_bind_vertex_buffers(
                command_buffer,
                0,
                &[geometry.vertex.handle()],
                &[0],
            );
            self.device.cmd_bind_index_buffer(
                command_buffer,
                geometry.index.handle(),
                0,
                vk::IndexType::UINT32,
            );
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.layout(),
                0,
                &[self.descriptor_set],
                &[self.uniforms.dynamic_offset(slot)],
            );

            set_viewport_scissor(&self.device, command_buffer, extent);
            self.device
                .cmd_draw_indexed(command_buffer, geometry.index_count, 1, 0, 0, 0);
        }
    }
}

/// Point the layer's descriptor set at its uniform ring and texture.
pub(crate) fn write_layer_descriptors(
    device: &Device,
    set: vk::DescriptorSet,
    uniforms: &UniformRing,
    texture: &Texture,
) {
    let buffer_infos = [vk::DescriptorBufferInfo::builder()
        .buffer(uniforms.buffer_handle())
        .offset(0)
        .range(uniforms.descriptor_range())
        .build()];
    let image_infos = [vk::DescriptorImageInfo::builder()
        .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        .image_view(texture.view())
        .sampler(texture.sampler())
        .build()];

    let writes = [
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
            .buffer_info(&buffer_infos)
            .build(),
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(1)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos)
            .build(),
    ];

    unsafe {
        device.update_descriptor_sets(&writes, &[]);
    }
}

/// Full-output viewport and scissor, set dynamically each frame.
pub(crate) fn set_viewport_scissor(
    device: &Device,
    command_buffer: vk::CommandBuffer,
    extent: vk::Extent2D,
) {
    let viewport = vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    };
    let scissor = vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    };
    unsafe {
        device.cmd_set_viewport(command_buffer, 0, &[viewport]);
        device.cmd_set_scissor(command_buffer, 0, &[scissor]);
    }
}

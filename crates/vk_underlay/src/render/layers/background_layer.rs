//! Background layer
//!
//! A static fullscreen quad at maximum depth, textured and drawn before the
//! mesh with depth writes disabled and a less-or-equal depth test, so it can
//! never occlude the foreground. Geometry never changes, so the quad keeps
//! compact 16-bit indices and identity transforms; only the time value
//! animates.

use crate::assets::ImageData;
use crate::render::host::HostDeviceContext;
use crate::render::layers::mesh_layer::{set_viewport_scissor, write_layer_descriptors};
use crate::render::vulkan::{
    Buffer, DepthMode, DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder,
    GraphicsPipeline, PipelineCache, SceneUniforms, Texture, UniformRing, VulkanResult,
};
use ash::{vk, Device};

/// Vertex of the background quad: position and texture coordinate only.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct BackgroundVertex {
    position: [f32; 3],
    tex_coord: [f32; 2],
}

unsafe impl bytemuck::Pod for BackgroundVertex {}
unsafe impl bytemuck::Zeroable for BackgroundVertex {}

// Normalized device coordinates, z = 1.0 puts the quad as far as possible.
const QUAD_VERTICES: [BackgroundVertex; 4] = [
    BackgroundVertex {
        position: [-1.0, -1.0, 1.0],
        tex_coord: [0.0, 1.0],
    },
    BackgroundVertex {
        position: [1.0, -1.0, 1.0],
        tex_coord: [1.0, 1.0],
    },
    BackgroundVertex {
        position: [1.0, 1.0, 1.0],
        tex_coord: [1.0, 0.0],
    },
    BackgroundVertex {
        position: [-1.0, 1.0, 1.0],
        tex_coord: [0.0, 0.0],
    },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

fn binding_description() -> vk::VertexInputBindingDescription {
    vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<BackgroundVertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }
}

fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
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
            format: vk::Format::R32G32_SFLOAT,
            offset: 12,
        },
    ]
}

/// The fullscreen background quad layer
pub struct BackgroundLayer {
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
    index_buffer: Buffer,
    vertex_buffer: Buffer,
    device: Device,
}

impl BackgroundLayer {
    /// Create the layer and record its texture upload into `command_buffer`.
    pub fn new(
        ctx: &HostDeviceContext,
        command_buffer: vk::CommandBuffer,
        min_uniform_alignment: vk::DeviceSize,
        vertex_spirv: &[u8],
        fragment_spirv: &[u8],
        pixels: &ImageData,
    ) -> VulkanResult<Self> {
        let device = ctx.device.clone();
        let memory_properties = unsafe {
            ctx.instance
                .get_physical_device_memory_properties(ctx.physical_device)
        };
        let host_visible =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        let texture = Texture::upload(&device, &memory_properties, command_buffer, pixels)?;

        let vertex_buffer = Buffer::with_data(
            device.clone(),
            &memory_properties,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            host_visible,
            &QUAD_VERTICES,
        )?;
        let index_buffer = Buffer::with_data(
            device.clone(),
            &memory_properties,
            vk::BufferUsageFlags::INDEX_BUFFER,
            host_visible,
            &QUAD_INDICES,
        )?;

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
        let bindings = [binding_description()];
        let attributes = attribute_descriptions();
        let pipeline = GraphicsPipeline::new(
            device.clone(),
            &pipeline_cache,
            ctx.render_pass,
            set_layout.handle(),
            vertex_spirv,
            fragment_spirv,
            &bindings,
            &attributes,
            DepthMode::Background,
        )?;

        log::debug!("Background layer initialized");

        Ok(Self {
            pipeline,
            pipeline_cache,
            descriptor_set,
            descriptor_pool,
            set_layout,
            uniforms,
            texture,
            index_buffer,
            vertex_buffer,
            device,
        })
    }

    /// Write this frame's uniform slot: identity transforms plus the raw
    /// time value.
    pub fn update_slot(&self, slot: u32, time: f32) -> VulkanResult<()> {
        let identity = crate::foundation::math::to_cols_array(
            &crate::foundation::math::Mat4::identity(),
        );
        let uniforms = SceneUniforms {
            model: identity,
            view: identity,
            proj: identity,
            time,
        };
        self.uniforms.write_slot(slot, &uniforms)
    }

    /// Record the quad draw into `command_buffer`
    pub fn record(&self, command_buffer: vk::CommandBuffer, slot: u32, extent: vk::Extent2D) {
        unsafe {
            self.device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.handle(),
            );
            self.device.cmd_bind_vertex_buffers(
                command_buffer,
                0,
                &[self.vertex_buffer.handle()],
                &[0],
            );
            self.device.cmd_bind_index_buffer(
                command_buffer,
                self.index_buffer.handle(),
                0,
                vk::IndexType::UINT16,
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
                .cmd_draw_indexed(command_buffer, QUAD_INDICES.len() as u32, 1, 0, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_two_triangles_at_far_plane() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_VERTICES.iter().all(|v| v.position[2] == 1.0));
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn background_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<BackgroundVertex>(), 20);
        let attrs = attribute_descriptions();
        assert_eq!(attrs[1].offset, 12);
    }
}

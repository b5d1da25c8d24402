//! Texture upload pipeline
//!
//! Stages decoded pixel data into a host-visible buffer, then records the
//! upload into the command buffer lent by the host for the current frame:
//! barrier to transfer-destination, buffer-to-image copy, barrier to
//! shader-read-only. The engine never creates or submits its own command
//! buffer, so the staging buffer must outlive the frame that executes the
//! copy; it is owned by the texture and freed with it.
//!
//! The layout is a finite state machine with exactly two supported
//! transitions. Anything else is a contract violation and is rejected.

use crate::assets::ImageData;
use crate::render::vulkan::{memory, Buffer, VulkanError, VulkanResult};
use ash::{vk, Device};

/// Sampled 2D texture: image, memory, view, sampler and the staging buffer
/// whose copy is recorded but not yet executed.
pub struct Texture {
    device: Device,
    sampler: vk::Sampler,
    view: vk::ImageView,
    image: vk::Image,
    image_memory: vk::DeviceMemory,
    // Kept alive until the texture dies; the recorded copy reads from it
    // when the host submits the frame.
    _staging: Buffer,
    layout: vk::ImageLayout,
}

impl Texture {
    /// Create a device-local image from `pixels` and record its upload into
    /// `command_buffer`. On return the recorded commands leave the image in
    /// `SHADER_READ_ONLY_OPTIMAL`.
    pub fn upload(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        command_buffer: vk::CommandBuffer,
        pixels: &ImageData,
    ) -> VulkanResult<Self> {
        let extent = vk::Extent2D {
            width: pixels.width,
            height: pixels.height,
        };

        // Stage the pixel bytes in host-visible memory.
        let staging = Buffer::with_data(
            device.clone(),
            memory_properties,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            &pixels.data,
        )?;

        // Device-local image.
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(vk::Format::R8G8B8A8_SRGB)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device
                .create_image(&image_info, None)
                .map_err(VulkanError::Api)?
        };

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index = match memory::select_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            memory_properties,
        ) {
            Some(index) => index,
            None => {
                unsafe { device.destroy_image(image, None) };
                return Err(VulkanError::NoSuitableMemoryType {
                    type_bits: requirements.memory_type_bits,
                    required: vk::MemoryPropertyFlags::DEVICE_LOCAL,
                });
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let image_memory = unsafe {
            match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(err) => {
                    device.destroy_image(image, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        unsafe {
            if let Err(err) = device.bind_image_memory(image, image_memory, 0) {
                device.destroy_image(image, None);
                device.free_memory(image_memory, None);
                return Err(VulkanError::Api(err));
            }
        }

        // Record the upload: Undefined -> TransferDst, copy, -> ShaderRead.
        let mut layout = vk::ImageLayout::UNDEFINED;
        transition_layout(
            device,
            command_buffer,
            image,
            &mut layout,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;
        copy_buffer_to_image(device, command_buffer, staging.handle(), image, extent);
        transition_layout(
            device,
            command_buffer,
            image,
            &mut layout,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(vk::Format::R8G8B8A8_SRGB)
            .subresource_range(color_subresource_range());

        let view = unsafe {
            device
                .create_image_view(&view_info, None)
                .map_err(VulkanError::Api)?
        };

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);

        let sampler = unsafe {
            device
                .create_sampler(&sampler_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: device.clone(),
            sampler,
            view,
            image,
            image_memory,
            _staging: staging,
            layout,
        })
    }

    /// Image view for descriptor binding
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Sampler for descriptor binding
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Current image layout
    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.image_memory, None);
        }
    }
}

fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// Record a layout transition barrier. Only the two upload transitions are
/// implemented; anything else is rejected without recording.
fn transition_layout(
    device: &Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    layout: &mut vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> VulkanResult<()> {
    let old_layout = *layout;
    let (src_access, dst_access, src_stage, dst_stage) = match (old_layout, new_layout) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => (
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
        ),
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => (
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        _ => {
            return Err(VulkanError::UnsupportedLayoutTransition {
                old: old_layout,
                new: new_layout,
            })
        }
    };

    let barrier = vk::ImageMemoryBarrier::builder()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_subresource_range())
        .src_access_mask(src_access)
        .dst_access_mask(dst_access);

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            src_stage,
            dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier.build()],
        );
    }

    *layout = new_layout;
    Ok(())
}

fn copy_buffer_to_image(
    device: &Device,
    command_buffer: vk::CommandBuffer,
    buffer: vk::Buffer,
    image: vk::Image,
    extent: vk::Extent2D,
) {
    let region = vk::BufferImageCopy::builder()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        })
        .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
        .image_extent(vk::Extent3D {
            width: extent.width,
            height: extent.height,
            depth: 1,
        });

    unsafe {
        device.cmd_copy_buffer_to_image(
            command_buffer,
            buffer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region.build()],
        );
    }
}

//! Per-frame uniform ring
//!
//! One uniform buffer holds a disjoint, alignment-padded region per
//! frame-in-flight slot. Each frame maps exactly its slot's region, writes
//! the transform matrices and time value, and unmaps; the descriptor binds
//! the whole buffer with a dynamic offset of `slot * stride`.

use crate::render::vulkan::{align_up, Buffer, VulkanResult};
use ash::{vk, Device};

/// Hard ceiling on concurrently outstanding frames
pub const MAX_FRAMES_IN_FLIGHT: u32 = 3;

/// Uniform block layout shared by both layers: three column-major 4x4
/// matrices followed by a scalar time value, in that fixed order.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SceneUniforms {
    /// Model matrix, column-major
    pub model: [f32; 16],
    /// View matrix, column-major
    pub view: [f32; 16],
    /// Projection matrix, column-major
    pub proj: [f32; 16],
    /// Animation time
    pub time: f32,
}

unsafe impl bytemuck::Pod for SceneUniforms {}
unsafe impl bytemuck::Zeroable for SceneUniforms {}

/// Raw byte size of one uniform block: 3 matrices + the time scalar
pub const SCENE_UNIFORM_SIZE: vk::DeviceSize = std::mem::size_of::<SceneUniforms>() as u64;

/// The ring of per-slot uniform regions
pub struct UniformRing {
    buffer: Buffer,
    slot_stride: vk::DeviceSize,
}

impl UniformRing {
    /// Allocate the ring: `align_up(block, min_alignment) * frames_in_flight`
    /// bytes of host-visible memory.
    ///
    /// # Panics
    /// If `frames_in_flight` is zero or above [`MAX_FRAMES_IN_FLIGHT`].
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        min_uniform_alignment: vk::DeviceSize,
        frames_in_flight: u32,
    ) -> VulkanResult<Self> {
        assert!(
            frames_in_flight >= 1 && frames_in_flight <= MAX_FRAMES_IN_FLIGHT,
            "frames in flight must be in 1..={MAX_FRAMES_IN_FLIGHT}, got {frames_in_flight}"
        );

        let slot_stride = align_up(SCENE_UNIFORM_SIZE, min_uniform_alignment);
        let buffer = Buffer::new(
            device,
            memory_properties,
            slot_stride * vk::DeviceSize::from(frames_in_flight),
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        Ok(Self {
            buffer,
            slot_stride,
        })
    }

    /// Write one slot's uniform block. Maps only that slot's region.
    pub fn write_slot(&self, slot: u32, uniforms: &SceneUniforms) -> VulkanResult<()> {
        let offset = vk::DeviceSize::from(slot) * self.slot_stride;
        self.buffer
            .write_bytes(offset, bytemuck::bytes_of(uniforms))
    }

    /// Dynamic descriptor offset for a slot
    pub fn dynamic_offset(&self, slot: u32) -> u32 {
        (vk::DeviceSize::from(slot) * self.slot_stride) as u32
    }

    /// The descriptor's buffer range: one raw uniform block
    pub fn descriptor_range(&self) -> vk::DeviceSize {
        SCENE_UNIFORM_SIZE
    }

    /// Get the underlying buffer handle
    pub fn buffer_handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_tightly_packed() {
        // 3 * 64 bytes of matrices + 4 bytes of time.
        assert_eq!(SCENE_UNIFORM_SIZE, 196);
    }

    #[test]
    fn slot_stride_math() {
        // The ring pads each slot to the device alignment; check the
        // arithmetic the ring is built on.
        let stride = align_up(SCENE_UNIFORM_SIZE, 256);
        assert_eq!(stride, 256);
        assert_eq!(align_up(SCENE_UNIFORM_SIZE, 64), 256);
        assert_eq!(align_up(SCENE_UNIFORM_SIZE, 4), 196);
    }
}

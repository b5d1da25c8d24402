//! Buffer creation and memory management
//!
//! RAII buffer wrapper: create handle, query requirements, select a memory
//! type, allocate, bind. Drop destroys the handle and then frees the memory,
//! exactly once.

use crate::render::vulkan::{memory, VulkanError, VulkanResult};
use ash::{vk, Device};

/// A device buffer together with the memory block that backs it.
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it.
    pub fn new(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        required_flags: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index = match memory::select_memory_type(
            requirements.memory_type_bits,
            required_flags,
            memory_properties,
        ) {
            Some(index) => index,
            None => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(VulkanError::NoSuitableMemoryType {
                    type_bits: requirements.memory_type_bits,
                    required: required_flags,
                });
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(err) => {
                    device.destroy_buffer(buffer, None);
                    return Err(VulkanError::Api(err));
                }
            }
        };

        unsafe {
            if let Err(err) = device.bind_buffer_memory(buffer, memory, 0) {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(err));
            }
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Create a host-visible buffer and fill it immediately.
    pub fn with_data<T: bytemuck::Pod>(
        device: Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        usage: vk::BufferUsageFlags,
        required_flags: vk::MemoryPropertyFlags,
        data: &[T],
    ) -> VulkanResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self::new(
            device,
            memory_properties,
            bytes.len() as vk::DeviceSize,
            usage,
            required_flags,
        )?;
        buffer.write_bytes(0, bytes)?;
        Ok(buffer)
    }

    /// Map a region, copy `bytes` into it, unmap. The buffer must be
    /// host-visible and the region must lie inside the allocation.
    pub fn write_bytes(&self, offset: vk::DeviceSize, bytes: &[u8]) -> VulkanResult<()> {
        unsafe {
            let ptr = self
                .device
                .map_memory(
                    self.memory,
                    offset,
                    bytes.len() as vk::DeviceSize,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(VulkanError::Api)?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), bytes.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get the byte size the buffer was created with
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// The vertex/index buffer pair for the current geometry.
///
/// Recreated atomically on every geometry change; never resized in place.
/// The index buffer always holds 32-bit indices so pipeline binding stays
/// uniform regardless of mesh size.
pub struct GeometryBuffers {
    /// Vertex buffer, filled at creation
    pub vertex: Buffer,
    /// Index buffer (`u32` elements), filled at creation
    pub index: Buffer,
    /// Number of indices to draw
    pub index_count: u32,
}

impl GeometryBuffers {
    /// Create a host-visible vertex/index pair sized exactly to the mesh.
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        mesh: &crate::render::mesh::Mesh,
    ) -> VulkanResult<Self> {
        let host_visible =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        let vertex = Buffer::with_data(
            device.clone(),
            memory_properties,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            host_visible,
            &mesh.vertices,
        )?;
        let index = Buffer::with_data(
            device.clone(),
            memory_properties,
            vk::BufferUsageFlags::INDEX_BUFFER,
            host_visible,
            &mesh.indices,
        )?;

        Ok(Self {
            vertex,
            index,
            index_count: mesh.index_count(),
        })
    }
}

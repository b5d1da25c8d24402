//! Host interface
//!
//! The host rendering engine owns the Vulkan instance, device, render pass,
//! window and frame pacing. The underlay core only borrows handles through
//! this narrow interface and performs all GPU work synchronously inside the
//! host's pre-frame and record callbacks, on the host's render thread.

use ash::vk;

/// Handles the host lends the engine for its whole lifetime. Queried once at
/// initialization.
#[derive(Clone)]
pub struct HostDeviceContext {
    /// Instance-level function table
    pub instance: ash::Instance,
    /// Device-level function table
    pub device: ash::Device,
    /// Physical device the host created the device from
    pub physical_device: vk::PhysicalDevice,
    /// Render pass the host records the main pass with
    pub render_pass: vk::RenderPass,
    /// Number of concurrently outstanding frames, at most 3
    pub frames_in_flight: u32,
}

/// Identifies one of the precompiled shader blobs the host asset system
/// supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderAsset {
    /// Vertex shader for the mesh layer
    MeshVertex,
    /// Fragment shader for the mesh layer
    MeshFragment,
    /// Vertex shader for the background quad
    BackgroundVertex,
    /// Fragment shader for the background quad
    BackgroundFragment,
}

/// Callback surface the host implements.
///
/// Contract: for every rendered frame the host calls the engine's pre-frame
/// entry point first and the record entry point second, both on its render
/// thread. The command buffer is only valid between
/// [`begin_external_commands`](RenderHost::begin_external_commands) and
/// [`end_external_commands`](RenderHost::end_external_commands).
pub trait RenderHost {
    /// Device handles, queried once at lazy initialization
    fn device_context(&self) -> HostDeviceContext;

    /// Frame slot for the frame currently being prepared,
    /// in `[0, frames_in_flight)`
    fn current_frame_slot(&self) -> u32;

    /// Current output size in pixels
    fn output_size(&self) -> vk::Extent2D;

    /// Command buffer for the current frame. Valid only between the
    /// begin/end external-commands markers.
    fn command_buffer(&self) -> vk::CommandBuffer;

    /// Mark the start of externally recorded commands
    fn begin_external_commands(&mut self);

    /// Mark the end of externally recorded commands
    fn end_external_commands(&mut self);

    /// Fetch a precompiled SPIR-V blob from the host asset system
    fn shader_bytes(&self, asset: ShaderAsset) -> std::io::Result<Vec<u8>>;
}

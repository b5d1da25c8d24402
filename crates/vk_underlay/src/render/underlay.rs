//! Underlay control surface and frame sequencer
//!
//! [`Underlay`] is the host-facing object: plain setters for geometry source
//! and transform inputs, a needs-render flag the host polls, and the two
//! per-frame entry points. The GPU-side state lives in [`UnderlayRenderer`],
//! created lazily on the first pre-frame call and destroyed through the
//! render-thread job queue.
//!
//! GPU resource creation failures are unrecoverable here: a partially
//! initialized pipeline cannot safely render, so they log a diagnostic and
//! abort the process. Model loading failures only fall back to the built-in
//! cube.

use crate::assets::{ImageData, ModelLoader};
use crate::config::{CameraConfig, UnderlayConfig};
use crate::foundation::math::{self, Point3, Vec3};
use crate::render::host::{HostDeviceContext, RenderHost, ShaderAsset};
use crate::render::jobs::RenderJobQueue;
use crate::render::layers::{BackgroundLayer, MeshLayer};
use crate::render::mesh::Mesh;
use crate::render::vulkan::{SceneUniforms, VulkanResult, MAX_FRAMES_IN_FLIGHT};
use std::path::PathBuf;

/// Where the mesh layer's geometry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    /// The built-in unit cube
    Builtin,
    /// A model file to parse
    Custom(PathBuf),
}

/// Resolve a geometry source to a mesh. A custom source that cannot be
/// loaded, or that parses into an invalid mesh, falls back to the built-in
/// cube so the render loop is never interrupted.
pub fn resolve_geometry(source: &GeometrySource) -> Mesh {
    match source {
        GeometrySource::Builtin => ModelLoader::built_in_cube(),
        GeometrySource::Custom(path) => match ModelLoader::load_model(path) {
            Ok(mesh) if mesh.is_valid() => mesh,
            Ok(_) => {
                log::warn!(
                    "Model {} produced invalid geometry, falling back to built-in cube",
                    path.display()
                );
                ModelLoader::built_in_cube()
            }
            Err(err) => {
                log::warn!("{err}; falling back to built-in cube");
                ModelLoader::built_in_cube()
            }
        },
    }
}

/// Abort with a diagnostic. Used for resource-creation failures, which have
/// no retry or degraded mode.
fn fatal(context: &str, err: &dyn std::fmt::Display) -> ! {
    log::error!("{context}: {err}");
    std::process::abort();
}

struct ShaderSet {
    mesh_vertex: Vec<u8>,
    mesh_fragment: Vec<u8>,
    background_vertex: Vec<u8>,
    background_fragment: Vec<u8>,
}

impl ShaderSet {
    fn load(host: &dyn RenderHost, with_background: bool) -> std::io::Result<Self> {
        let fetch = |asset| host.shader_bytes(asset);
        Ok(Self {
            mesh_vertex: fetch(ShaderAsset::MeshVertex)?,
            mesh_fragment: fetch(ShaderAsset::MeshFragment)?,
            background_vertex: if with_background {
                fetch(ShaderAsset::BackgroundVertex)?
            } else {
                Vec::new()
            },
            background_fragment: if with_background {
                fetch(ShaderAsset::BackgroundFragment)?
            } else {
                Vec::new()
            },
        })
    }
}

/// Host-facing control surface for the underlay.
pub struct Underlay {
    config: UnderlayConfig,
    geometry_source: GeometrySource,
    pending_geometry: Option<GeometrySource>,
    position: Vec3,
    t: f32,
    needs_render: bool,
    shaders: Option<ShaderSet>,
    renderer: Option<UnderlayRenderer>,
}

impl Underlay {
    /// Create an underlay with the given configuration. Geometry defaults to
    /// the built-in cube positioned a little in front of the camera.
    pub fn new(config: UnderlayConfig) -> Self {
        Self {
            config,
            geometry_source: GeometrySource::Builtin,
            pending_geometry: None,
            position: Vec3::new(0.0, 0.0, -5.0),
            t: 0.0,
            needs_render: true,
            shaders: None,
            renderer: None,
        }
    }

    /// Select the geometry source. A change is resolved once, on the next
    /// pre-frame call, and marks the output as needing a new frame.
    pub fn set_geometry_source(&mut self, source: GeometrySource) {
        if source == self.geometry_source && self.renderer.is_some() {
            return;
        }
        self.geometry_source = source.clone();
        self.pending_geometry = Some(source);
        self.needs_render = true;
    }

    /// Update the externally driven transform inputs: mesh position and the
    /// normalized animation time.
    pub fn set_model_transform_inputs(&mut self, position: Vec3, t: f32) {
        if position == self.position && t == self.t {
            return;
        }
        self.position = position;
        self.t = t;
        self.needs_render = true;
    }

    /// Return and clear the needs-render flag. The host polls this to decide
    /// whether to schedule a new frame.
    pub fn take_needs_render(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }

    /// Pre-frame callback: lazy one-time initialization, then application of
    /// any pending geometry change. Idempotent otherwise.
    pub fn pre_frame(&mut self, host: &mut dyn RenderHost) {
        if self.shaders.is_none() {
            match ShaderSet::load(host, self.config.background.enabled) {
                Ok(shaders) => self.shaders = Some(shaders),
                Err(err) => fatal("failed to load shader assets", &err),
            }
        }

        if self.renderer.is_none() {
            let Some(shaders) = self.shaders.as_ref() else {
                return;
            };
            let mesh = resolve_geometry(&self.geometry_source);
            self.pending_geometry = None;
            match UnderlayRenderer::initialize(host, &self.config, shaders, &mesh) {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(err) => fatal("GPU resource initialization failed", &err),
            }
            return;
        }

        if let Some(source) = self.pending_geometry.take() {
            let mesh = resolve_geometry(&source);
            if let Some(renderer) = self.renderer.as_mut() {
                if let Err(err) = renderer.apply_geometry(&mesh) {
                    fatal("geometry buffer recreation failed", &err);
                }
            }
        }
    }

    /// Record callback: write this frame's uniform slots and record both
    /// layers' draws, bracketed by the host's external-command markers.
    pub fn record_frame(&mut self, host: &mut dyn RenderHost) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.record(host, self.position, self.t, &self.config.camera);
        }
    }

    /// Schedule deferred destruction of all GPU resources. The actual
    /// teardown runs when the host drains the queue on its render thread.
    pub fn release_resources(&mut self, jobs: &RenderJobQueue) {
        if let Some(renderer) = self.renderer.take() {
            self.shaders = None;
            jobs.schedule(move || {
                drop(renderer);
                log::debug!("Underlay GPU resources released");
            });
        }
    }

    /// Whether GPU-side state currently exists
    pub fn is_initialized(&self) -> bool {
        self.renderer.is_some()
    }
}

impl Default for Underlay {
    fn default() -> Self {
        Self::new(UnderlayConfig::default())
    }
}

/// GPU-side state: both layers plus the handles needed to drive them.
pub struct UnderlayRenderer {
    mesh_layer: MeshLayer,
    background: Option<BackgroundLayer>,
    ctx: HostDeviceContext,
}

impl UnderlayRenderer {
    /// Query the host's device context and build all GPU resources. Texture
    /// uploads are recorded into the host's current command buffer.
    fn initialize(
        host: &mut dyn RenderHost,
        config: &UnderlayConfig,
        shaders: &ShaderSet,
        mesh: &Mesh,
    ) -> VulkanResult<Self> {
        let ctx = host.device_context();
        assert!(
            ctx.frames_in_flight >= 1 && ctx.frames_in_flight <= MAX_FRAMES_IN_FLIGHT,
            "host reported {} frames in flight",
            ctx.frames_in_flight
        );

        let limits = unsafe {
            ctx.instance
                .get_physical_device_properties(ctx.physical_device)
                .limits
        };
        let min_uniform_alignment = limits.min_uniform_buffer_offset_alignment;

        let mesh_pixels = load_texture_or(&config.texture_path, || {
            ImageData::checkerboard(256, 256, 32, [0, 255, 255, 255], [255, 0, 0, 255])
        });
        let background_pixels = config.background.enabled.then(|| {
            load_texture_or(&config.background.texture_path, || {
                ImageData::vertical_gradient(256, 256, [8, 12, 40, 255], [96, 128, 192, 255])
            })
        });

        host.begin_external_commands();
        let command_buffer = host.command_buffer();

        let background = match background_pixels {
            Some(pixels) => Some(BackgroundLayer::new(
                &ctx,
                command_buffer,
                min_uniform_alignment,
                &shaders.background_vertex,
                &shaders.background_fragment,
                &pixels,
            )?),
            None => None,
        };
        let mesh_layer = MeshLayer::new(
            &ctx,
            command_buffer,
            min_uniform_alignment,
            &shaders.mesh_vertex,
            &shaders.mesh_fragment,
            &mesh_pixels,
            mesh,
        )?;

        host.end_external_commands();

        log::info!(
            "Underlay initialized ({} frames in flight, background {})",
            ctx.frames_in_flight,
            if background.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            mesh_layer,
            background,
            ctx,
        })
    }

    /// Swap the mesh layer's geometry buffers
    fn apply_geometry(&mut self, mesh: &Mesh) -> VulkanResult<()> {
        self.mesh_layer.recreate_geometry(mesh)
    }

    /// Per-frame recording: uniform writes first, then the draws, background
    /// before foreground.
    fn record(&mut self, host: &mut dyn RenderHost, position: Vec3, t: f32, camera: &CameraConfig) {
        let slot = host.current_frame_slot();
        assert!(
            slot < self.ctx.frames_in_flight,
            "frame slot {slot} out of range"
        );
        let extent = host.output_size();
        let aspect = if extent.height == 0 {
            1.0
        } else {
            extent.width as f32 / extent.height as f32
        };

        let eye = Point3::new(camera.eye[0], camera.eye[1], camera.eye[2]);
        let uniforms = SceneUniforms {
            model: math::to_cols_array(&math::spinning_model(position, t)),
            view: math::to_cols_array(&math::look_at(
                eye,
                Point3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            )),
            proj: math::to_cols_array(&math::perspective(
                camera.fov_y_degrees,
                aspect,
                camera.near,
                camera.far,
            )),
            time: t * 10.0,
        };

        // The slot's previous GPU use finished under the host's
        // frame-in-flight pacing; the writes happen strictly before the draw
        // is recorded on this same thread.
        if let Err(err) = self.mesh_layer.update_slot(slot, &uniforms) {
            fatal("uniform buffer write failed", &err);
        }
        if let Some(background) = &self.background {
            if let Err(err) = background.update_slot(slot, t) {
                fatal("uniform buffer write failed", &err);
            }
        }

        host.begin_external_commands();
        let command_buffer = host.command_buffer();
        if let Some(background) = &self.background {
            background.record(command_buffer, slot, extent);
        }
        self.mesh_layer.record(command_buffer, slot, extent);
        host.end_external_commands();
    }
}

fn load_texture_or(path: &Option<PathBuf>, fallback: impl FnOnce() -> ImageData) -> ImageData {
    match path {
        Some(path) => match ImageData::from_file(path) {
            Ok(pixels) => pixels,
            Err(err) => {
                log::warn!("{err}; using procedural texture");
                fallback()
            }
        },
        None => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_falls_back_to_cube() {
        let mesh = resolve_geometry(&GeometrySource::Custom(PathBuf::from(
            "does/not/exist.obj",
        )));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.is_valid());
    }

    #[test]
    fn builtin_source_resolves_to_cube() {
        let mesh = resolve_geometry(&GeometrySource::Builtin);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn custom_source_loads_valid_models() {
        let mut path = std::env::temp_dir();
        path.push(format!("vk_underlay_{}_resolve.obj", std::process::id()));
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n").unwrap();

        let mesh = resolve_geometry(&GeometrySource::Custom(path.clone()));
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn setters_raise_needs_render() {
        let mut underlay = Underlay::default();
        assert!(underlay.take_needs_render());
        assert!(!underlay.take_needs_render());

        underlay.set_model_transform_inputs(Vec3::new(1.0, 0.0, -5.0), 0.25);
        assert!(underlay.take_needs_render());

        // Unchanged inputs do not re-raise the flag.
        underlay.set_model_transform_inputs(Vec3::new(1.0, 0.0, -5.0), 0.25);
        assert!(!underlay.take_needs_render());

        underlay.set_geometry_source(GeometrySource::Custom(PathBuf::from("a.obj")));
        assert!(underlay.take_needs_render());
    }

    #[test]
    fn release_without_renderer_schedules_nothing() {
        let mut underlay = Underlay::default();
        let jobs = RenderJobQueue::new();
        underlay.release_resources(&jobs);
        assert_eq!(jobs.pending(), 0);
        assert!(!underlay.is_initialized());
    }
}

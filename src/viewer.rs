use anyhow::Context;
use winit::{dpi::PhysicalSize, event::WindowEvent};

use crate::{
    camera::{OrbitCamera, OrbitControls},
    config::ViewerConfig,
    importer::MeshImporter,
    light::DirectionalLight,
    scene_graph::Scene,
};

/// Steps of viewer setup, in order. `ModelLoaded` and `ModelLoadFailed` are alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPhase {
    AwaitingSurface,
    EngineCreated,
    SceneBuilding,
    AwaitingModel,
    ModelLoaded,
    ModelLoadFailed,
    RenderLoopRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { mesh_count: usize },
    Failed { error: String },
}

/// What the viewer needs from a GPU renderer.
pub trait RenderBackend {
    fn size(&self) -> PhysicalSize<u32>;
    fn upload_scene(&mut self, scene: &Scene) -> anyhow::Result<()>;
    fn resize(&mut self, new_size: PhysicalSize<u32>);
    fn render(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError>;
}

pub struct Viewer<R> {
    renderer: R,
    scene: Scene,
    controls: OrbitControls,
    phase: InitPhase,
    load_outcome: LoadOutcome,
}

impl<R: RenderBackend> Viewer<R> {
    /// Runs the whole setup sequence. A missing surface is fatal and happens
    /// before anything else is created; a failed model load is not.
    pub async fn initialize<S, F, I>(
        surface: Option<S>,
        config: &ViewerConfig,
        create_renderer: F,
        importer: &I,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce(S) -> anyhow::Result<R>,
        I: MeshImporter,
    {
        let mut phase = InitPhase::AwaitingSurface;
        log::info!("Initializing scene...");

        let Some(surface) = surface else {
            anyhow::bail!("Surface `{}` not found", config.surface_id);
        };

        let mut renderer = create_renderer(surface).context("Failed to create renderer")?;
        advance(&mut phase, InitPhase::EngineCreated);

        advance(&mut phase, InitPhase::SceneBuilding);
        let mut scene = build_scene(config);

        advance(&mut phase, InitPhase::AwaitingModel);
        let load_outcome = load_model(importer, config, &mut scene).await;
        advance(
            &mut phase,
            match load_outcome {
                LoadOutcome::Loaded { .. } => InitPhase::ModelLoaded,
                LoadOutcome::Failed { .. } => InitPhase::ModelLoadFailed,
            },
        );

        renderer
            .upload_scene(&scene)
            .context("Failed to upload scene to the GPU")?;

        advance(&mut phase, InitPhase::RenderLoopRunning);
        log::info!("Viewer initialized successfully");

        Ok(Self {
            renderer,
            scene,
            controls: OrbitControls::default(),
            phase,
            load_outcome,
        })
    }

    pub fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.renderer.render(&self.scene)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        log::debug!("Resizing to {}x{}", new_size.width, new_size.height);
        self.renderer.resize(new_size);
    }

    /// Returns `true` if the event moved the camera or was otherwise consumed.
    pub fn handle_input(&mut self, event: &WindowEvent) -> bool {
        self.controls.handle_event(&mut self.scene.camera, event)
    }

    pub fn phase(&self) -> InitPhase {
        self.phase
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    #[allow(dead_code)]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

fn advance(phase: &mut InitPhase, next: InitPhase) {
    log::debug!("{:?} -> {:?}", phase, next);
    *phase = next;
}

pub fn build_scene(config: &ViewerConfig) -> Scene {
    let [r, g, b, a] = config.clear_color;

    let (lower, upper) = config.camera_radius_limits;
    let camera = OrbitCamera::new(
        config.camera_alpha,
        config.camera_beta,
        config.camera_radius,
        config.camera_target,
    )
    .with_radius_limits(lower, upper);

    let sun = DirectionalLight::new("sun", config.light_direction, config.light_intensity);
    log::debug!(
        "Created light {} with intensity {}",
        sun.name,
        sun.intensity()
    );

    Scene::new(wgpu::Color { r, g, b, a }, camera, sun)
}

/// Imports the configured model into `scene`. Failures are logged and
/// reported, never propagated: the scene stays usable without the model.
pub async fn load_model<I: MeshImporter>(
    importer: &I,
    config: &ViewerConfig,
    scene: &mut Scene,
) -> LoadOutcome {
    let path = config.model_path();
    log::info!("Loading model {}...", path.display());

    match importer.import(&path).await {
        Ok(model) => {
            let meshes = scene.spawn_model(model);
            log::info!(
                "Successfully loaded model {} ({} meshes)",
                path.display(),
                meshes.len()
            );

            // Only the first mesh is normalized; the rest keep their authored placement.
            if let Some(node) = meshes.first().and_then(|&id| scene.node_mut(id)) {
                node.transform.translation.y = 0.0;
            }

            LoadOutcome::Loaded {
                mesh_count: meshes.len(),
            }
        }
        Err(e) => {
            log::error!("Failed to load model {}: {:#}", path.display(), e);
            LoadOutcome::Failed {
                error: format!("{:#}", e),
            }
        }
    }
}

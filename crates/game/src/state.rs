//! Windowed program state: window, renderer, camera and the show itself.

use crate::config::AppConfig;
use audio::KiraBackend;
use engine_core::{CancelToken, Time};
use renderer::{Camera, PointInstance, Renderer, ViewportAdapter};
use simulation::FireworkShow;
use std::sync::Arc;
use winit::window::Window;

pub struct ShowState {
    pub(crate) window: Arc<Window>,
    /// `None` when the GPU could not be initialized; the show keeps running
    /// (and playing sound) without visuals.
    pub(crate) renderer: Option<Renderer>,
    pub(crate) camera: Camera,
    pub(crate) viewport: ViewportAdapter,
    pub(crate) time: Time,
    pub(crate) show: FireworkShow<KiraBackend>,
    pub(crate) config: AppConfig,
    pub(crate) token: CancelToken,
    /// Scratch buffer for GPU instances, reused every frame.
    pub(crate) instances: Vec<PointInstance>,
    pub(crate) running: bool,
}

impl ShowState {
    pub async fn new(window: Arc<Window>, config: AppConfig, token: CancelToken) -> Self {
        let size = window.inner_size();
        let viewport = ViewportAdapter::new(size.width, size.height, window.scale_factor());
        let mut camera = Camera::default();
        if let Some(current) = viewport.current() {
            camera.set_aspect(current.render.0, current.render.1);
        }

        let renderer = match Renderer::new(window.clone()).await {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                log::error!("Renderer unavailable, continuing without visuals: {:#}", e);
                None
            }
        };

        let show = FireworkShow::new(config.fireworks.clone(), KiraBackend::new());

        Self {
            window,
            renderer,
            camera,
            viewport,
            time: Time::new(),
            show,
            config,
            token,
            instances: Vec::new(),
            running: true,
        }
    }

    /// Apply any pending resize, then advance the simulation by the frame delta.
    pub fn update(&mut self) {
        if let Some(size) = self.viewport.take_pending() {
            self.camera.set_aspect(size.render.0, size.render.1);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(size);
            }
            log::debug!("Viewport now {:?} (render {:?})", size.surface, size.render);
        }

        self.time.update();
        self.show.tick(self.time.delta_seconds());
    }

    pub fn launch(&mut self) {
        self.show.launch();
    }

    /// Re-read `config.ron` and apply it to the running show.
    pub fn reload_config(&mut self) {
        let config = AppConfig::load();
        self.show.set_config(config.fireworks.clone());
        self.config = config;
        log::info!("Reloaded config.ron");
    }

    pub fn toggle_sound(&mut self) {
        let enabled = self.show.toggle_sound();
        log::info!("Sound {}", if enabled { "on" } else { "off" });
    }

    pub fn has_visuals(&self) -> bool {
        self.renderer.is_some()
    }

    /// Stop the loop and release audio and GPU resources. Safe to call twice.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.token.cancel();
        self.show.shutdown();
        self.renderer = None;

        let stats = self.show.stats();
        log::info!(
            "Show over after {:.1}s: {} launched, {} exploded, peak {} in flight",
            self.time.elapsed_seconds(),
            stats.launched,
            stats.exploded,
            stats.peak_active
        );
    }
}

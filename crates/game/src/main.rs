//! Fireworks show: press Space, Enter or click to launch a rocket.

mod config;
mod events;
mod headless;
mod render;
mod state;

pub use state::ShowState;

use anyhow::{bail, Context, Result};
use engine_core::{CancelToken, TickLoop};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

/// How the program was asked to run.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Windowed,
    Headless { seconds: f32 },
}

const DEFAULT_HEADLESS_SECONDS: f32 = 10.0;

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Mode> {
    let mut args = args.into_iter();
    let mut mode = Mode::Windowed;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => {
                let seconds = match args.next() {
                    Some(value) => value
                        .parse::<f32>()
                        .with_context(|| format!("--headless expects seconds, got {:?}", value))?,
                    None => DEFAULT_HEADLESS_SECONDS,
                };
                if !seconds.is_finite() || seconds < 0.0 {
                    bail!("--headless duration must be a non-negative number");
                }
                mode = Mode::Headless { seconds };
            }
            other => bail!("unknown argument {:?} (usage: fireworks [--headless <seconds>])", other),
        }
    }
    Ok(mode)
}

struct App {
    state: Option<ShowState>,
    token: CancelToken,
}

impl App {
    fn new(token: CancelToken) -> Self {
        Self { state: None, token }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            let config = config::AppConfig::load();
            let mut window_attrs = Window::default_attributes()
                .with_title("Fireworks")
                .with_inner_size(winit::dpi::LogicalSize::new(config.window_width, config.window_height));
            if config.fullscreen {
                window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
            }

            let window = match event_loop.create_window(window_attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            let state = pollster::block_on(ShowState::new(window.clone(), config, self.token.clone()));
            self.state = Some(state);
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) || !state.running {
                event_loop.exit();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.shutdown();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mode = parse_args(std::env::args().skip(1))?;
    let token = CancelToken::new();

    if let Mode::Headless { seconds } = mode {
        log::info!("Running headless for {}s", seconds);
        let config = config::AppConfig::load();
        let tick_loop = TickLoop::new(headless::TICK_RATE as f64, token);
        headless::run(config.fireworks, seconds, &tick_loop);
        return Ok(());
    }

    config::write_default_if_missing();

    println!("Fireworks");
    println!("  Space / Enter / Left Click - launch");
    println!("  M  - toggle sound");
    println!("  F5 - reload config.ron");
    println!("  Esc - quit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(token);
    event_loop.run_app(&mut app)?;

    Ok(())
}

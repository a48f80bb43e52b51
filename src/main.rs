use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use pollster::FutureExt as _;
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod app;
mod camera;
mod config;
mod input;
mod mesh;
mod particles;
mod planet;
mod renderer;
mod scene;
mod window;

use app::App;
use config::Config;

/// Lit meshes, an orbiting solar system and a particle fountain.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Scene file. The built-in demo scene is used when it does not exist.
    #[arg(short, long, default_value = "scene.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title(config.window.title.as_str())
        .with_inner_size(LogicalSize::<u32> {
            width: config.window.width,
            height: config.window.height,
        })
        .build(&event_loop)?;

    let mut app = App::new(window, &config).block_on()?;
    info!("Escape quits, 1-9 switch cameras, Space toggles particles");

    let mut last_update_inst = Instant::now();

    event_loop.run(move |e, _, control_flow| {
        match e {
            Event::WindowEvent { event, window_id } if window_id == app.window().id() => {
                app.handle_window_event(&event);

                match event {
                    WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                    WindowEvent::Resized(size) => app.resize(size.into()),
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        app.resize((*new_inner_size).into())
                    }
                    _ => (),
                }
            }
            Event::MainEventsCleared => {
                let target_frame_interval = Duration::from_secs_f64(1.0 / 60.0);
                let elapsed_from_last_update = last_update_inst.elapsed();
                if target_frame_interval > elapsed_from_last_update {
                    let wait = target_frame_interval - elapsed_from_last_update;
                    *control_flow = ControlFlow::WaitUntil(Instant::now() + wait);
                    return;
                }

                last_update_inst = Instant::now();
                let dt = elapsed_from_last_update.as_secs_f32();

                app.update(dt);
                if app.quit_requested() {
                    debug!("Quit requested");
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                app.render();
            }
            _ => (),
        }
    });
}

mod mesh;
mod particle;
mod render_target;
#[allow(clippy::module_inception)]
mod renderer;
mod scene;

pub use renderer::Renderer;

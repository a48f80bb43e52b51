mod generator;
mod pool;

pub use generator::{EmitterSettings, ParticleGenerator, ParticleInstance};

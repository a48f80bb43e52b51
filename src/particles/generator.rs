use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{vec3, Vec3, Vec4};
use log::{debug, info};
use rand::prelude::*;
use rand_pcg::Pcg64Mcg;

use super::pool::{Particle, ParticlePool};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EmitterSettings {
    /// Particles per second.
    pub emission_rate: f32,
    /// Seconds.
    pub lifetime: f32,
    pub start_color: Vec4,
    pub end_color: Vec4,
    pub acceleration: Vec3,
    pub start_speed: f32,
    pub start_scale: f32,
    pub end_scale: f32,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            emission_rate: 0.,
            lifetime: 0.,
            start_color: Vec4::ZERO,
            end_color: Vec4::ZERO,
            acceleration: Vec3::ZERO,
            start_speed: 0.,
            start_scale: 0.,
            end_scale: 0.,
        }
    }
}

impl EmitterSettings {
    fn emission_interval(&self) -> Option<f32> {
        (self.emission_rate.is_finite() && self.emission_rate > 0.)
            .then(|| 1. / self.emission_rate)
    }

    fn life_ratio(&self, particle: &Particle) -> f32 {
        if self.lifetime > 0. {
            (particle.life / self.lifetime).clamp(0., 1.)
        } else {
            0.
        }
    }
}

/// Color of `particle` from its remaining life: `end` at death, `start` at
/// spawn.
pub fn particle_color(settings: &EmitterSettings, particle: &Particle) -> Vec4 {
    settings
        .end_color
        .lerp(settings.start_color, settings.life_ratio(particle))
}

pub fn particle_scale(settings: &EmitterSettings, particle: &Particle) -> f32 {
    let t = settings.life_ratio(particle);
    settings.end_scale + (settings.start_scale - settings.end_scale) * t
}

/// Per-instance data of one billboard, laid out for the instance vertex
/// buffer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ParticleInstance {
    /// xyz position, w scale
    pub position_scale: Vec4,
    pub color: Vec4,
}

pub struct ParticleGenerator {
    pool: ParticlePool,
    settings: EmitterSettings,
    emitter_position: Vec3,
    emitting: bool,
    time_since_emission: f32,
    emitted: u64,
    rng: Pcg64Mcg,
    staging: Vec<ParticleInstance>,
}

impl ParticleGenerator {
    pub fn new(emitter_position: Vec3, max_particles: usize, seed: u64) -> Self {
        info!(
            "Particle generator with {} slots, RNG seeded with {}",
            max_particles, seed
        );

        Self {
            pool: ParticlePool::new(max_particles),
            settings: Default::default(),
            emitter_position,
            emitting: false,
            time_since_emission: 0.,
            emitted: 0,
            rng: Pcg64Mcg::seed_from_u64(seed),
            staging: Vec::with_capacity(max_particles),
        }
    }

    /// Applies `settings` and starts emitting.
    pub fn setup(&mut self, settings: EmitterSettings) {
        self.settings = settings;
        self.emitting = true;
    }

    pub fn start(&mut self) {
        self.emitting = true;
    }

    /// Stops emitting and drawing. The pool keeps its state.
    pub fn stop(&mut self) {
        self.emitting = false;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    pub fn emitter_position(&self) -> Vec3 {
        self.emitter_position
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn alive_count(&self) -> usize {
        self.staging.len()
    }

    /// Spawns attempted so far, including ones dropped on a full pool.
    #[cfg(test)]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        self.pool.particles()
    }

    /// Live particles packed for the GPU, as of the last `update`.
    pub fn instances(&self) -> &[ParticleInstance] {
        &self.staging
    }

    pub fn find_unused_particle(&self) -> Option<usize> {
        self.pool.find_unused()
    }

    pub fn update(&mut self, dt: f32) {
        if !self.emitting {
            return;
        }

        if let Some(interval) = self.settings.emission_interval() {
            self.time_since_emission += dt;
            let due = (self.time_since_emission / interval).floor();
            // Every due interval is consumed, including those whose spawn a
            // full pool drops, so no backlog builds up while it is full.
            self.time_since_emission = (self.time_since_emission - due * interval).max(0.);

            let due = due as u64;
            self.emitted = self.emitted.saturating_add(due);

            // Spawns past the pool size could never be alive together.
            for _ in 0..due.min(self.capacity() as u64) {
                if self.find_unused_particle().is_none() {
                    break;
                }
                let velocity = random_on_sphere(&mut self.rng) * self.settings.start_speed;
                self.pool
                    .spawn(self.emitter_position, velocity, self.settings.lifetime);
            }
        }

        let settings = &self.settings;
        let staging = &mut self.staging;
        staging.clear();
        self.pool.advance(dt, settings.acceleration, |particle| {
            staging.push(ParticleInstance {
                position_scale: particle
                    .position
                    .extend(particle_scale(settings, particle)),
                color: particle_color(settings, particle),
            });
        });

        debug!(
            "{} particles alive, {} emitted",
            self.alive_count(),
            self.emitted
        );
    }
}

fn random_on_sphere(rng: &mut impl Rng) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let angle: f32 = rng.gen_range(0.0..TAU);
    let r = (1. - z * z).max(0.).sqrt();
    vec3(r * angle.cos(), r * angle.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(emission_rate: f32, lifetime: f32) -> EmitterSettings {
        EmitterSettings {
            emission_rate,
            lifetime,
            start_color: Vec4::new(1., 0., 0., 1.),
            end_color: Vec4::new(0., 0., 1., 0.),
            acceleration: Vec3::ZERO,
            start_speed: 1.,
            start_scale: 2.,
            end_scale: 0.5,
        }
    }

    #[test]
    fn idle_generator_does_nothing() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 8, 1);
        generator.update(10.);
        assert_eq!(generator.emitted(), 0);
        assert_eq!(generator.alive_count(), 0);
    }

    #[test]
    fn one_emission_per_interval_with_four_tick_lifetime() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 16, 7);
        generator.setup(settings(2., 2.));

        let mut max_alive = 0;
        for _ in 0..5 {
            generator.update(0.5);
            max_alive = max_alive.max(generator.alive_count());
        }

        assert_eq!(generator.emitted(), 5);
        assert!(max_alive <= 4);
        // The first particle died on the fourth tick, the second on the fifth.
        assert_eq!(generator.alive_count(), 3);
    }

    #[test]
    fn one_per_second_rate_emits_on_whole_seconds() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 16, 7);
        generator.setup(settings(1., 2.));

        for _ in 0..5 {
            generator.update(0.5);
        }

        assert_eq!(generator.emitted(), 2);
        assert_eq!(generator.alive_count(), 1);
    }

    #[test]
    fn alive_count_never_exceeds_capacity() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 3, 42);
        generator.setup(settings(100., 10.));

        for _ in 0..20 {
            generator.update(0.1);
            assert!(generator.alive_count() <= generator.capacity());
        }
        assert_eq!(generator.alive_count(), 3);
        assert_eq!(generator.find_unused_particle(), None);
    }

    #[test]
    fn full_pool_leaves_existing_particles_alone() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 2, 3);
        generator.setup(settings(2., 10.));
        generator.update(0.5);
        generator.update(0.5);
        let before = generator.particles().to_vec();

        // Emits once more but the pool is full. Only integration happens.
        generator.update(0.5);
        assert_eq!(generator.emitted(), 3);

        for (old, new) in before.iter().zip(generator.particles()) {
            assert!((old.life - 0.5 - new.life).abs() < 1e-6);
            assert_eq!(old.velocity, new.velocity);
            assert!(new
                .position
                .abs_diff_eq(old.position + old.velocity * 0.5, 1e-5));
        }
    }

    #[test]
    fn huge_rate_fills_the_pool_and_returns() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 8, 13);
        generator.setup(settings(1e10, 1.));

        generator.update(0.016);
        assert_eq!(generator.alive_count(), 8);
        assert!(generator.emitted() > 8);

        generator.update(0.016);
        assert_eq!(generator.alive_count(), 8);
    }

    #[test]
    fn unusable_rates_never_emit() {
        for rate in [0., -5., f32::INFINITY, f32::NAN] {
            let mut generator = ParticleGenerator::new(Vec3::ZERO, 4, 2);
            generator.setup(settings(rate, 1.));
            generator.update(1.);
            assert_eq!(generator.emitted(), 0, "rate {}", rate);
            assert_eq!(generator.alive_count(), 0);
        }
    }

    #[test]
    fn life_decreases_by_dt_each_update() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 1, 9);
        generator.setup(settings(1., 3.));
        generator.update(1.);
        let life = generator.particles()[0].life;
        assert!((life - 2.).abs() < 1e-6);

        generator.update(0.25);
        assert!((generator.particles()[0].life - 1.75).abs() < 1e-6);
    }

    #[test]
    fn spawned_velocity_has_start_speed() {
        let mut generator = ParticleGenerator::new(Vec3::ZERO, 32, 11);
        let mut s = settings(10., 5.);
        s.start_speed = 3.;
        generator.setup(s);
        generator.update(1.);

        for particle in generator.particles().iter().filter(|p| p.is_alive()) {
            assert!((particle.velocity.length() - 3.).abs() < 1e-4);
        }
    }

    #[test]
    fn interpolation_hits_start_and_end_values() {
        let s = settings(1., 4.);
        let fresh = Particle {
            life: 4.,
            ..Default::default()
        };
        let spent = Particle {
            life: 0.,
            ..Default::default()
        };

        assert!(particle_color(&s, &fresh).abs_diff_eq(s.start_color, 1e-6));
        assert!(particle_color(&s, &spent).abs_diff_eq(s.end_color, 1e-6));
        assert!((particle_scale(&s, &fresh) - s.start_scale).abs() < 1e-6);
        assert!((particle_scale(&s, &spent) - s.end_scale).abs() < 1e-6);
    }

    #[test]
    fn staging_matches_live_particles() {
        let mut generator = ParticleGenerator::new(vec3(1., 2., 3.), 4, 5);
        let mut s = settings(1., 2.);
        s.start_speed = 0.;
        generator.setup(s);
        generator.update(1.);

        let instances = generator.instances();
        assert_eq!(instances.len(), 1);
        // Half the lifetime is left.
        let expected_scale = 0.5 + (2. - 0.5) * 0.5;
        assert!(instances[0]
            .position_scale
            .abs_diff_eq(vec3(1., 2., 3.).extend(expected_scale), 1e-6));
    }
}

use std::collections::VecDeque;

use glam::Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Counts down while alive. Dead at or below zero.
    pub life: f32,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// Fixed-capacity particle storage. Dead slots are tracked in a FIFO ring
/// so spawning never scans the pool.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    free: VecDeque<usize>,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::default(); capacity],
            free: (0..capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub fn alive_count(&self) -> usize {
        self.capacity() - self.free.len()
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Index of the slot the next spawn will take, if any.
    pub fn find_unused(&self) -> Option<usize> {
        self.free.front().copied()
    }

    /// Takes a free slot and initializes it. Returns `None` and leaves the
    /// pool untouched when every slot is alive.
    pub fn spawn(&mut self, position: Vec3, velocity: Vec3, life: f32) -> Option<usize> {
        let index = self.free.pop_front()?;
        self.particles[index] = Particle {
            position,
            velocity,
            life,
        };

        // A zero lifetime dies immediately.
        if !self.particles[index].is_alive() {
            self.free.push_back(index);
        }

        Some(index)
    }

    /// Integrates every alive particle and calls `f` with each one that is
    /// still alive afterwards. Particles that die here go back on the ring.
    pub fn advance<F>(&mut self, dt: f32, acceleration: Vec3, mut f: F)
    where
        F: FnMut(&Particle),
    {
        for (index, particle) in self.particles.iter_mut().enumerate() {
            if !particle.is_alive() {
                continue;
            }

            particle.life -= dt;
            particle.velocity += acceleration * dt;
            particle.position += particle.velocity * dt;

            if particle.is_alive() {
                f(particle);
            } else {
                self.free.push_back(index);
            }
        }
    }
}

use glam::{Mat4, Quat, Vec3, Vec4};

/// A body orbiting `orbit_center` on the XZ plane while spinning about its
/// own axis. Drives the transform of one scene instance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Planet {
    pub radius: f32,
    pub orbit_center: Vec3,
    pub orbit_radius: f32,
    /// Radians per second.
    pub orbit_speed: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    pub rotation_axis: Vec3,
    pub color: Vec4,
    /// Index of the scene instance this planet moves.
    pub instance: usize,
    position: Vec3,
    spin: Quat,
}

impl Planet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        radius: f32,
        orbit_center: Vec3,
        orbit_radius: f32,
        orbit_speed_degrees: f32,
        rotation_speed: f32,
        rotation_axis: Vec3,
        color: Vec4,
        instance: usize,
    ) -> Self {
        Self {
            radius,
            orbit_center,
            orbit_radius,
            orbit_speed: orbit_speed_degrees.to_radians(),
            rotation_speed,
            rotation_axis: rotation_axis.try_normalize().unwrap_or(Vec3::Y),
            color,
            instance,
            position: orbit_center + Vec3::X * orbit_radius,
            spin: Quat::IDENTITY,
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn update(&mut self, dt: f32) {
        let orbit = Quat::from_rotation_y(-self.orbit_speed * dt);
        self.position = self.orbit_center + orbit * (self.position - self.orbit_center);

        self.spin =
            (self.spin * Quat::from_axis_angle(self.rotation_axis, self.rotation_speed * dt))
                .normalize();
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.radius), self.spin, self.position)
    }
}

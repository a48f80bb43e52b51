use std::f32::consts::PI;

use glam::{vec3, Mat4, Vec2, Vec3};
use winit::event::{MouseButton, VirtualKeyCode};

use crate::input::Input;

const SPEED: f32 = 3.;
const FAST_SPEED: f32 = 8.;
const TURN_SPEED: f32 = 2. * PI;

const FOV_Y: f32 = PI * 0.25;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.;

/// Fly camera. `theta` is yaw and `phi` is pitch, both in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub theta: f32,
    pub phi: f32,
    pub is_static: bool,
    last_mouse: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(vec3(-10., 2., 0.), 0., 0., false)
    }
}

impl Camera {
    pub fn new(position: Vec3, theta: f32, phi: f32, is_static: bool) -> Self {
        Self {
            position,
            theta,
            phi,
            is_static,
            last_mouse: None,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (theta, phi) = (self.theta.to_radians(), self.phi.to_radians());
        vec3(phi.cos() * theta.cos(), phi.sin(), phi.cos() * theta.sin())
    }

    fn right(&self) -> Vec3 {
        let theta = self.theta.to_radians();
        vec3(-theta.sin(), 0., theta.cos())
    }

    pub fn update(&mut self, dt: f32, input: &impl Input) {
        if self.is_static {
            return;
        }

        let forward = self.forward();
        let right = self.right();
        let up = Vec3::Y;

        let speed = if input.is_key_down(VirtualKeyCode::LShift) {
            FAST_SPEED
        } else {
            SPEED
        };

        let axes = [
            (VirtualKeyCode::E, up),
            (VirtualKeyCode::Q, -up),
            (VirtualKeyCode::D, right),
            (VirtualKeyCode::A, -right),
            (VirtualKeyCode::W, forward),
            (VirtualKeyCode::S, -forward),
        ];
        for (key, direction) in axes {
            if input.is_key_down(key) {
                self.position += direction * dt * speed;
            }
        }

        let mouse = input.mouse_position();
        if input.is_mouse_button_down(MouseButton::Right) {
            if let Some(last) = self.last_mouse {
                // Window y grows downwards; dragging up pitches up.
                let delta = mouse - last;
                self.theta += TURN_SPEED * delta.x * dt;
                self.phi -= TURN_SPEED * delta.y * dt;
            }
        }
        self.last_mouse = Some(mouse);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self, width: f32, height: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y, width / height, NEAR, FAR)
    }
}

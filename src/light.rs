use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub name: &'static str,
    direction: Vec3,
    intensity: f32,
}

impl DirectionalLight {
    pub fn new(name: &'static str, direction: Vec3, intensity: f32) -> Self {
        Self {
            name,
            direction,
            intensity,
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniform {
    // xyz: normalized direction the light travels in, w: intensity
    pub direction_intensity: [f32; 4],
    pub ambient: f32,
    _padding: [f32; 3],
}

impl LightUniform {
    pub fn new(light: &DirectionalLight, ambient: f32) -> Self {
        let direction = light.direction().normalize_or(Vec3::NEG_Y);

        Self {
            direction_intensity: direction.extend(light.intensity()).to_array(),
            ambient,
            _padding: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_normalizes_direction() {
        let light = DirectionalLight::new("sun", Vec3::new(-1.0, -2.0, -1.0), 2.2);
        let uniform = LightUniform::new(&light, 0.05);
        let [x, y, z, intensity] = uniform.direction_intensity;

        assert!((Vec3::new(x, y, z).length() - 1.0).abs() < 1e-5);
        assert!(y < 0.0);
        assert!((intensity - 2.2).abs() < 1e-6);
    }

    #[test]
    fn degenerate_direction_points_down() {
        let light = DirectionalLight::new("sun", Vec3::ZERO, 1.0);
        let uniform = LightUniform::new(&light, 0.0);
        assert_eq!(uniform.direction_intensity, [0.0, -1.0, 0.0, 1.0]);
    }
}

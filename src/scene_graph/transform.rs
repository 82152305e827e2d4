use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[allow(dead_code)]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_gltf(transform: gltf::scene::Transform) -> Self {
        let (translation, rotation, scale) = transform.decomposed();

        Self {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let transform =
            Transform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
        let m = transform.matrix().to_cols_array();
        assert_eq!(&m[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(m[0], 2.0);
        assert_eq!(m[5], 2.0);
        assert_eq!(m[10], 2.0);
    }

    #[test]
    fn from_gltf_decomposes_matrices() {
        let transform = Transform::from_gltf(gltf::scene::Transform::Decomposed {
            translation: [0.0, 2.5, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        });
        assert_eq!(transform.translation, Vec3::new(0.0, 2.5, 0.0));
        assert_eq!(transform.scale, Vec3::ONE);
    }
}

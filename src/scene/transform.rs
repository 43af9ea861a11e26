use glam::{EulerRot, Quat, Vec3};

/// Translation / rotation / scale triple of a 2D entity.
///
/// `translation.z` is the entity depth used for draw ordering; `rotation`
/// holds Euler angles in radians (XYZ order). Equality is exact and is what
/// every mutator compares against before marking a node dirty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Rotation as a quaternion.
    #[inline]
    #[must_use]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Composes `self` (the parent) with `child`, returning the child's
    /// placement in the parent's coordinate space.
    ///
    /// The child translation is scaled and rotated by the parent before being
    /// offset; rotations add and scales multiply.
    #[must_use]
    pub fn compose(&self, child: &Self) -> Self {
        let offset = self.rotation_quat() * (self.scale * child.translation);
        Self {
            translation: self.translation + offset,
            rotation: self.rotation + child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Relative translation.
    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
    }

    /// Relative rotation (radians).
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    /// Multiplicative scale.
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Placement data of one entity as consumed by the renderer.
///
/// `inherited` is the composition of every ancestor transform and is only
/// valid once the clean pass has visited the node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub transform: Transform,
    pub inherited: Transform,
}

impl Metrics {
    /// Final placement of the entity (`inherited ∘ transform`).
    #[must_use]
    pub fn world(&self) -> Transform {
        self.inherited.compose(&self.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn vec3_approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn identity_is_neutral() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 0.5), Vec3::new(0.0, 0.0, 0.3), Vec3::splat(2.0));
        assert_eq!(Transform::IDENTITY.compose(&t), t);
        assert_eq!(t.compose(&Transform::IDENTITY).translation, t.translation);
    }

    #[test]
    fn compose_scales_and_rotates_child_offset() {
        let parent = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, FRAC_PI_2),
            Vec3::splat(2.0),
        );
        let child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));

        let world = parent.compose(&child);
        assert!(vec3_approx(world.translation, Vec3::new(10.0, 2.0, 0.0)));
        assert!(vec3_approx(world.scale, Vec3::splat(2.0)));
        assert!(vec3_approx(world.rotation, Vec3::new(0.0, 0.0, FRAC_PI_2)));
    }
}

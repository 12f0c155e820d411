//! Transform with parent-relative hierarchy links
//!
//! The transform stores local position/rotation/scale. The parent link is a
//! non-owning lookup: a parent never owns its children's lifetime, it only
//! tracks them so recursive queries can walk down the hierarchy. Links are
//! edited exclusively through [`Scene::set_parent`](crate::scene::Scene::set_parent),
//! which keeps the parent graph acyclic.

use crate::ecs::EntityId;
use crate::foundation::math::{trs_matrix, Mat4, Quat, Vec3};

/// Local spatial state of a GameObject
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Scale relative to the parent
    pub scale: Vec3,

    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Transform {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set rotation from Euler angles (radians, XYZ order)
    pub fn with_rotation_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Quat::from_euler_angles(x, y, z);
        self
    }

    /// Builder pattern: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Move by `offset` in parent space
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Rotate around `axis` (parent space) by `angle` radians
    pub fn rotate_axis_angle(&mut self, axis: Vec3, angle: f32) {
        if let Some(axis) = nalgebra::Unit::try_new(axis, f32::EPSILON) {
            self.rotation = Quat::from_axis_angle(&axis, angle) * self.rotation;
        }
    }

    /// Local TRS matrix
    pub fn local_matrix(&self) -> Mat4 {
        trs_matrix(&self.position, &self.rotation, &self.scale)
    }

    /// Local forward direction (-Z)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Parent entity, if any
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether this transform sits at the top of a hierarchy
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    pub(crate) fn add_child_link(&mut self, child: EntityId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child_link(&mut self, child: EntityId) {
        self.children.retain(|c| *c != child);
    }

    pub(crate) fn take_children(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_identity_matrix() {
        assert_relative_eq!(Transform::identity().local_matrix(), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_trs_order() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::new(2.0, 2.0, 2.0));
        let point = transform
            .local_matrix()
            .transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(point.coords, Vec3::new(3.0, 2.0, 3.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_axis_angle() {
        let mut transform = Transform::identity();
        transform.rotate_axis_angle(Vec3::y(), FRAC_PI_2);

        // Forward (-Z) turned a quarter turn about +Y points to -X
        assert_relative_eq!(transform.forward(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_zero_axis_is_ignored() {
        let mut transform = Transform::identity();
        transform.rotate_axis_angle(Vec3::zeros(), 1.0);
        assert_relative_eq!(transform.rotation, Quat::identity(), epsilon = EPSILON);
    }
}

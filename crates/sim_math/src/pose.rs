//! Rigid-body pose.
//!
//! [`Pose3`] is a position plus orientation, expressed in the frame of the
//! entity's parent. Poses compose left to right: `parent * child` yields the
//! child expressed in the parent's parent frame.

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A rigid transform in double precision: rotate, then translate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Pose3 {
    /// Position relative to the parent frame, in metres.
    pub position: DVec3,
    /// Orientation as a unit quaternion.
    pub rotation: DQuat,
}

impl Pose3 {
    /// The identity pose: origin, no rotation.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Create a pose from position and rotation.
    #[must_use]
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Create a pose with the given position and no rotation.
    #[must_use]
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a pose from a position and roll/pitch/yaw angles in radians.
    #[must_use]
    pub fn from_xyz_rpy(position: DVec3, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            position,
            rotation: DQuat::from_euler(glam::EulerRot::ZYX, yaw, pitch, roll),
        }
    }

    /// Compute the 4×4 homogeneous matrix for this pose.
    #[must_use]
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position)
    }

    /// The inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            position: rotation * -self.position,
            rotation,
        }
    }

    /// Map a point from this pose's frame into the parent frame.
    #[must_use]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.position
    }

    /// Translate the pose by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: DVec3) -> Self {
        self.position += offset;
        self
    }
}

impl std::ops::Mul for Pose3 {
    type Output = Pose3;

    fn mul(self, child: Pose3) -> Pose3 {
        Pose3 {
            position: self.transform_point(child.position),
            rotation: self.rotation * child.rotation,
        }
    }
}

impl Default for Pose3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_identity_pose() {
        let p = Pose3::IDENTITY;
        assert_eq!(p.position, DVec3::ZERO);
        assert_eq!(p.rotation, DQuat::IDENTITY);
        assert_eq!(p.to_matrix(), DMat4::IDENTITY);
    }

    #[test]
    fn test_compose_translations() {
        let a = Pose3::from_position(DVec3::new(1.0, 0.0, 0.0));
        let b = Pose3::from_position(DVec3::new(0.0, 2.0, 0.0));
        assert_eq!((a * b).position, DVec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_rotation_applies_to_child_position() {
        let parent = Pose3::from_xyz_rpy(DVec3::ZERO, 0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let child = Pose3::from_position(DVec3::X);
        let world = parent * child;
        assert!((world.position - DVec3::Y).length() < EPS);
    }

    #[test]
    fn test_inverse_cancels() {
        let p = Pose3::from_xyz_rpy(DVec3::new(1.0, -2.0, 3.0), 0.1, 0.2, 0.3);
        let round = p * p.inverse();
        assert!(round.position.length() < EPS);
        assert!(round.rotation.angle_between(DQuat::IDENTITY) < EPS);
    }

    #[test]
    fn test_serialization_keeps_fields() {
        let p = Pose3::from_position(DVec3::new(1.0, 2.0, 3.0));
        let bytes = rmp_serde::to_vec(&p).unwrap();
        let restored: Pose3 = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(p, restored);
    }
}

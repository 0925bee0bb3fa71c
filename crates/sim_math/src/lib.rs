//! # sim_math
//!
//! Math types for the simulation core. Re-exports the double-precision
//! [`glam`] types used for world quantities (gravity, magnetic field, poses)
//! and defines [`Pose3`].

pub mod pose;

// Re-export glam types for convenience.
pub use glam::{DMat3, DMat4, DQuat, DVec3, EulerRot};

pub use pose::Pose3;

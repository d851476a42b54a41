//! Odometry and closed-loop movement control

pub mod boundary;
mod controller;

pub use controller::MovementController;

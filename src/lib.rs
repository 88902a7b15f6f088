//! Gameplay core for a small third-person action game.
//!
//! The simulation is headless: rapier3d supplies rigid bodies, contacts and
//! scene queries, and this crate layers the game rules on top: grounded
//! locomotion with ground-snapping and jump buffering, a pursuing enemy,
//! collision-reactive bullets, and an orbiting chase camera.

pub mod config;
pub mod game;

//! UI layer for the landing window: page shell, panels, and the scene canvas.

pub mod app;
pub mod scene_view;

pub use app::LandingApp;

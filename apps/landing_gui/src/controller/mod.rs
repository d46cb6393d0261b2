//! Controller layer: UI events, error classification, and command dispatch.

pub mod events;
pub mod orchestration;

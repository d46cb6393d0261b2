//! Backend bridge: command types and the worker thread that owns the page flows.

pub mod commands;
pub mod runtime;

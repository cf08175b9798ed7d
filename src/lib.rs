pub mod config;
pub mod debug_builders;
pub mod error;
pub mod net;
pub mod physics;
pub mod slide_core;
pub mod spawn;
pub mod state;
pub mod vehicle;

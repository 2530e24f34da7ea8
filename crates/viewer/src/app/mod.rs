pub(crate) mod bootstrap;
mod config;
mod demo_world;
mod input;
pub(crate) mod loop_runner;
mod metrics;
mod presenter;
mod screenshot;

pub mod autopilot;
pub mod constants;
pub mod engine;
pub mod logging;
pub mod rng;
pub mod server_protocol;
pub mod types;
pub mod world;

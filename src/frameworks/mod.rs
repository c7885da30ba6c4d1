// Frameworks layer: runtime bootstrap, configuration and scenario loading.

pub mod config;
pub mod scenario;
pub mod server;

#[path = "k8s/client/mod.rs"]
pub mod client;
#[path = "k8s/probe/health/mod.rs"]
pub mod health;
#[path = "k8s/probe/liveness/mod.rs"]
pub mod liveness;
#[path = "k8s/resolver/mod.rs"]
pub mod resolver;
#[path = "k8s/scale/mod.rs"]
pub mod scale;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod config;
pub mod error;
pub mod shutdown;

pub use error::{Error, Result};

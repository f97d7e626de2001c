// Package app wires liveness reporting, the termination handler and the
// drain performed before exit.

#[allow(clippy::module_inception)]
mod app;
mod drain;

pub use app::App;
pub use drain::{Drain, DrainPlan};

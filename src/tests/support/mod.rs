// Shared fakes for unit and scenario tests.

mod control_plane;
mod grpc;
mod reporter;

pub use control_plane::FakeControlPlane;
pub use grpc::{free_port, health_client, served};
pub use reporter::RecordingReporter;

// Legacy liveness marker file for probes that only test file existence.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing::debug;

pub const HEALTHY_FILE_NAME: &str = "/tmp/healthy";

/// Creates the zero-byte marker at `path`, leaving an existing file untouched.
pub fn create_healthy_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    OpenOptions::new().create(true).append(true).open(path)?;
    debug!(
        component = "liveness",
        event = "marker_created",
        path = %path.display(),
        "healthy marker file created"
    );
    Ok(())
}

/// Removes the marker at `path`. A missing file is not an error.
pub fn remove_healthy_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(
                component = "liveness",
                event = "marker_removed",
                path = %path.display(),
                "healthy marker file removed"
            );
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

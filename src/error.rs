// Error definitions shared by the control-plane helpers.

/// Boxed source error carried by control-plane and configuration failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied clue matched no deployment name in the list result.
    #[error("deployment name containing clue {0} was not found")]
    ClueNotFound(String),

    /// Any list / get-scale / update-scale failure, source kept as is.
    #[error("control-plane call failed: {0}")]
    ControlPlane(#[source] BoxError),

    /// The scale subresource came back without spec.replicas.
    #[error("scale of deployment {0} carries no replica count")]
    MissingReplicas(String),

    /// Building a client from in-cluster or explicit configuration failed.
    #[error("failed to load cluster configuration: {0}")]
    Config(#[source] BoxError),
}

impl Error {
    pub fn control_plane<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::ControlPlane(err.into())
    }

    pub fn config<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Config(err.into())
    }

    /// Returns the offending clue for a failed resolution.
    pub fn unmatched_clue(&self) -> Option<&str> {
        match self {
            Error::ClueNotFound(clue) => Some(clue),
            _ => None,
        }
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        Error::ControlPlane(Box::new(err))
    }
}

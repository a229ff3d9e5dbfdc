use std::io;

use thiserror::Error as ThisError;

pub type OpaqueError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("failed to resolve {host}, reason: {reason}")]
    Resolution { host: String, reason: String },
    #[error("{0}, raw sockets can only be opened by privileged processes")]
    Permission(#[source] io::Error),
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Opaque(#[from] OpaqueError),
}

impl Error {
    pub(crate) fn resolution(host: &str, reason: impl ToString) -> Self {
        Error::Resolution {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps a failed raw socket creation, singling out missing privileges.
    pub(crate) fn socket_creation(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Error::Permission(err),
            _ => Error::Opaque(format!("failed to create socket, reason: {}", err).into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputBuildError {
    #[error("probe count must be greater than zero")]
    ZeroCount,
    #[error("probe timeout must be greater than zero")]
    ZeroTimeout,
    #[error("network interface name is required")]
    MissingInterface,
    #[error("source host is required")]
    MissingSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_maps_to_permission() {
        let err = Error::socket_creation(io::Error::from_raw_os_error(1));
        assert!(matches!(err, Error::Permission(_)));
    }

    #[test]
    fn test_other_socket_errors_stay_opaque() {
        let err = Error::socket_creation(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(err, Error::Opaque(_)));
    }
}

//! Errors reported by the job queue contract.

/// The queue backend does not implement the requested operation.
#[derive(Debug, thiserror::Error)]
#[error("operation '{operation}' is not supported by the {backend} queue backend")]
pub struct UnsupportedOperation {
    backend: &'static str,
    operation: &'static str,
}

impl UnsupportedOperation {
    /// Report the given operation as unsupported by a backend.
    pub fn new(backend: &'static str, operation: &'static str) -> UnsupportedOperation {
        UnsupportedOperation { backend, operation }
    }

    /// Name of the operation that is not supported.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

/// Unable to encode a job into a queue payload.
#[derive(Debug, thiserror::Error)]
#[error("unable to encode job '{0}' into a queue payload")]
pub struct PayloadEncode(pub String);

/// Unable to decode the payload of a received job.
#[derive(Debug, thiserror::Error)]
#[error("unable to decode the payload of job '{0}'")]
pub struct PayloadDecode(pub String);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport send failed: {0}")]
    Send(String),

    #[error("a request with id {0} is already in flight")]
    DuplicateRequest(String),
}

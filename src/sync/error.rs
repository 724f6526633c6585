//! Sync error types.

/// Errors surfaced by the sync engine and its transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
    /// The request never got a response.
    Transport(String),
    /// The response body could not be decoded.
    Decode(String),
    /// A member edit carried neither a name nor a check-in flag.
    NoFieldsProvided,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Status { status, message } => {
                write!(f, "Server returned {}: {}", status, message)
            }
            SyncError::Transport(e) => write!(f, "Connection error: {}", e),
            SyncError::Decode(e) => write!(f, "Invalid response: {}", e),
            SyncError::NoFieldsProvided => write!(f, "No fields provided"),
        }
    }
}

impl std::error::Error for SyncError {}

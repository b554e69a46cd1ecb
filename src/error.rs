use std::fmt;

/// Central error types for the wardrobe client
#[derive(Debug)]
pub enum ClientError {
    /// Transport failure or non-success HTTP status
    Network(String),
    /// Backend answered but reported failure (`success: false`)
    Server(String),
    /// Response body could not be parsed
    Json(String),
    /// No user in the session; the call was never issued
    Unauthenticated,
    /// Bad file type, size or count
    Validation(String),
    /// Image compression failure
    Compression(String),
    /// Local key-value store failure
    Storage(std::io::Error),
    /// Configuration file failure
    Config(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Server(msg) => write!(f, "Server error: {}", msg),
            ClientError::Json(msg) => write!(f, "JSON error: {}", msg),
            ClientError::Unauthenticated => write!(f, "Not logged in"),
            ClientError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ClientError::Compression(msg) => write!(f, "Compression error: {}", msg),
            ClientError::Storage(e) => write!(f, "Storage error: {}", e),
            ClientError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

// Conversions from other error types
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Json(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Storage(e)
    }
}

/// User-friendly error messages for notifications
impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Could not reach the server. Please check your connection.".to_string()
            }
            ClientError::Server(msg) => msg.clone(),
            ClientError::Json(_) => "The server returned an unexpected response.".to_string(),
            ClientError::Unauthenticated => "Please log in first.".to_string(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Compression(msg) => msg.clone(),
            ClientError::Storage(_) => "Could not access local storage.".to_string(),
            ClientError::Config(_) => "The configuration file is invalid.".to_string(),
        }
    }
}

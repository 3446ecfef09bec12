use std::fmt;

#[derive(Debug)]
pub enum AIError {
    Network(String),
    Status(u16),
    Document(String),
    MissingText,
}

impl fmt::Display for AIError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AIError::Network(e) => write!(f, "AIError::Network: {}", e),
            AIError::Status(s) => write!(f, "AIError::Status: provider returned {}", s),
            AIError::Document(e) => write!(f, "AIError::Document: {}", e),
            AIError::MissingText => write!(f, "AIError::MissingText: no text in response"),
        }
    }
}
impl From<reqwest::Error> for AIError {
    fn from(e: reqwest::Error) -> Self {
        AIError::Network(e.without_url().to_string())
    }
}
impl From<serde_json::Error> for AIError {
    fn from(e: serde_json::Error) -> Self {
        AIError::Document(e.to_string())
    }
}

use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub enum CityError {
    Storage(String),
    Document(String),
    Duplicate(String),
    Unknown(String),
    Lookup(String),
}

impl fmt::Display for CityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CityError::Storage(e) => write!(f, "CityError::Storage: {}", e),
            CityError::Document(e) => write!(f, "CityError::Document: {}", e),
            CityError::Duplicate(name) => write!(f, "{} is already in your saved cities", name),
            CityError::Unknown(name) => write!(f, "{} is not a saved city", name),
            CityError::Lookup(message) => write!(f, "{}", message),
        }
    }
}
impl From<std::io::Error> for CityError {
    fn from(err: std::io::Error) -> Self { CityError::Storage(err.to_string()) }
}
impl From<serde_json::Error> for CityError {
    fn from(err: serde_json::Error) -> Self { CityError::Document(err.to_string()) }
}

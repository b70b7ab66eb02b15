#![warn(missing_docs)]
//! Lensbench specific error structures
use std::{error::Error, fmt::Display};

/// Lensbench application specific Result type
pub type BenchResult<T> = std::result::Result<T, BenchError>;

/// Errors that can be returned by the setup functions of a bench.
///
/// **Note**: The tracing core itself never fails. These errors only occur while building or
/// configuring a bench (e.g. loading a document, creating lens properties).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// error while setting up the scene geometry (objects, shapes, lens properties)
    Scene(String),
    /// error while configuring a ray emitter
    Emitter(String),
    /// errors while reading or parsing a bench document
    Document(String),
    /// errors console io
    Console(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scene(m) => {
                write!(f, "Scene:{m}")
            }
            Self::Emitter(m) => {
                write!(f, "Emitter:{m}")
            }
            Self::Document(m) => {
                write!(f, "Document:{m}")
            }
            Self::Console(m) => {
                write!(f, "Console:{m}")
            }
            Self::Other(m) => write!(f, "Lensbench Error:Other:{m}"),
        }
    }
}
impl Error for BenchError {}

impl std::convert::From<String> for BenchError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn from() {
        let error = BenchError::from("test".to_string());
        assert_eq!(error, BenchError::Other("test".to_string()));
    }
    #[test]
    fn display() {
        assert_eq!(
            format!("{}", BenchError::Scene("test".to_string())),
            "Scene:test"
        );
        assert_eq!(
            format!("{}", BenchError::Emitter("test".to_string())),
            "Emitter:test"
        );
        assert_eq!(
            format!("{}", BenchError::Document("test".to_string())),
            "Document:test"
        );
        assert_eq!(
            format!("{}", BenchError::Console("test".to_string())),
            "Console:test"
        );
        assert_eq!(
            format!("{}", BenchError::Other("test".to_string())),
            "Lensbench Error:Other:test"
        );
    }
    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", BenchError::Scene("test".to_string())),
            "Scene(\"test\")"
        );
    }
}

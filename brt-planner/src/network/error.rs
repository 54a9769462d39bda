//! Network loading error types.

use std::path::PathBuf;

/// The dataset contradicts itself or breaks a structural rule.
///
/// These are fatal at load time: planning over a graph with a broken
/// stop order would silently produce impossible journeys.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataIntegrityError {
    /// A stop declares a route that has no stop sequence
    #[error("stop {stop} references route {route:?} which has no known sequence")]
    UnknownRoute { stop: String, route: String },

    /// Two stops share an id but disagree on where or what they are
    #[error("stop {stop} is declared twice with conflicting {field}")]
    ConflictingStop { stop: String, field: &'static str },

    /// Two routes share a name
    #[error("route {0:?} is declared more than once")]
    DuplicateRoute(String),

    /// A route lists no stops
    #[error("route {0:?} has no stops")]
    EmptyRoute(String),

    /// A stop appears more than once in one route's sequence
    #[error("stop {stop} appears more than once on route {route:?}")]
    RepeatedStop { route: String, stop: String },

    /// A stop has out-of-range coordinates
    #[error("stop {stop} has invalid coordinates: {message}")]
    InvalidCoordinates { stop: String, message: String },

    /// A required identifier or name is blank
    #[error("blank {0}")]
    Blank(&'static str),
}

/// Errors from loading a transit network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The dataset file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid JSON for the expected shape
    #[error("failed to parse network dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// The dataset parsed but is inconsistent
    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_display() {
        let err = DataIntegrityError::UnknownRoute {
            stop: "FH".into(),
            route: "Blue Line".into(),
        };
        assert_eq!(
            err.to_string(),
            "stop FH references route \"Blue Line\" which has no known sequence"
        );

        let err = DataIntegrityError::ConflictingStop {
            stop: "FH".into(),
            field: "coordinates",
        };
        assert_eq!(
            err.to_string(),
            "stop FH is declared twice with conflicting coordinates"
        );
    }

    #[test]
    fn network_error_wraps_integrity() {
        let err: NetworkError = DataIntegrityError::EmptyRoute("Red Line".into()).into();
        assert_eq!(err.to_string(), "route \"Red Line\" has no stops");
    }
}

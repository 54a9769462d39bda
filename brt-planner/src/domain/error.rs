//! Domain error types.
//!
//! These errors represent invalid journey construction in the domain
//! layer. They are distinct from provider and data-loading errors.

use super::StopId;

/// Domain-level errors for journey construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// A transit journey must board and alight at different stops
    #[error("boarding and destination stop are both {0}")]
    SameBoardingAndDestination(StopId),

    /// A transit journey must name at least one route
    #[error("transit journey uses no routes")]
    NoRoutesUsed,

    /// Consecutive segments don't share an endpoint
    #[error("segments do not connect: {0}")]
    SegmentsNotConnected(&'static str),

    /// A segment has a negative or non-finite distance
    #[error("invalid segment distance: {0}")]
    InvalidDistance(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::SameBoardingAndDestination(StopId::parse("FH").unwrap());
        assert_eq!(err.to_string(), "boarding and destination stop are both FH");

        assert_eq!(
            DomainError::NoRoutesUsed.to_string(),
            "transit journey uses no routes"
        );

        let err = DomainError::SegmentsNotConnected("bus leg must start at boarding stop");
        assert_eq!(
            err.to_string(),
            "segments do not connect: bus leg must start at boarding stop"
        );

        assert_eq!(
            DomainError::InvalidDistance(-1.0).to_string(),
            "invalid segment distance: -1"
        );
    }
}

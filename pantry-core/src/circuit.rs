//! Circuit breaker state shared by the cache guard and the health endpoints.

use serde::{Deserialize, Serialize};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, calls flow normally
    Closed = 0,
    /// Circuit is open, calls are skipped until the cooldown elapses
    Open = 1,
    /// Cooldown elapsed and a single probe call is in flight
    HalfOpen = 2,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    /// Numeric form exported as a metrics gauge.
    pub fn as_gauge(&self) -> f64 {
        *self as u8 as f64
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_state_gauge_values() {
        assert_eq!(CircuitState::Closed.as_gauge(), 0.0);
        assert_eq!(CircuitState::Open.as_gauge(), 1.0);
        assert_eq!(CircuitState::HalfOpen.as_gauge(), 2.0);
    }

    #[test]
    fn test_circuit_state_serializes_snake_case() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen)?, "\"half_open\"");
        Ok(())
    }
}

//! Input validation for the admission boundary.
//!
//! The core transforms in [`LimiterState`](super::LimiterState) trust their
//! inputs. Anything arriving from outside the process goes through these
//! checks first.

use crate::error::{DripError, Result};

/// Require that an identity is set. Any string, including the empty one,
/// is a valid key.
pub fn require_identity(identity: Option<&str>) -> Result<&str> {
    identity.ok_or_else(|| DripError::invalid_argument("identity is required"))
}

/// Require that a timestamp is a finite number.
pub fn require_timestamp(at: f64) -> Result<f64> {
    if at.is_finite() {
        Ok(at)
    } else {
        Err(DripError::invalid_argument(format!(
            "timestamp must be finite, got {}",
            at
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_identity_present() {
        assert_eq!(assert_ok!(require_identity(Some("user1"))), "user1");
    }

    #[test]
    fn test_identity_missing() {
        assert_err!(require_identity(None));
    }

    #[test]
    fn test_empty_identity_accepted() {
        assert_eq!(assert_ok!(require_identity(Some(""))), "");
    }

    #[test]
    fn test_timestamp_validation() {
        assert_eq!(assert_ok!(require_timestamp(-3.5)), -3.5);
        assert_err!(require_timestamp(f64::NAN));
        assert_err!(require_timestamp(f64::INFINITY));
    }
}

pub mod admin;
pub mod blogs;
pub mod bookings;
pub mod health;
pub mod payments;

use crate::errors::AppError;
use crate::state::AppState;

/// Shared-secret check used by every mutating admin endpoint. Runs before
/// any store access, so a mismatch never has side effects.
pub(crate) fn check_secret(state: &AppState, provided: &str) -> Result<(), AppError> {
    if provided != state.config.admin_secret {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

//! Cause-chain inspection for sync failures.
//!
//! Both walks are bounded loops over `Error::source`, so cyclic or very
//! deep chains cannot hang or overflow the stack.

use std::error::Error;

use crate::core::errors::{DisconnectReason, TransportError};

/// Maximum number of causes followed below the outermost error.
pub const MAX_CAUSE_DEPTH: usize = 32;

/// True when any link of the chain is a transport disconnect caused by the
/// user cancelling authentication.
pub fn is_user_cancelled(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    for _ in 0..=MAX_CAUSE_DEPTH {
        let Some(err) = current else {
            return false;
        };
        if let Some(TransportError::Disconnected {
            reason: DisconnectReason::AuthCancelledByUser,
        }) = err.downcast_ref::<TransportError>()
        {
            return true;
        }
        current = err.source();
    }
    false
}

/// Strip transport wrappers and return the first specific failure.
///
/// Returns `error` itself when it is not a wrapper. At most
/// `MAX_CAUSE_DEPTH` wrappers are stripped; past that the root is unknown
/// and `error` is returned unchanged.
pub fn root_cause<'a>(error: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut current = error;
    for _ in 0..=MAX_CAUSE_DEPTH {
        let is_wrapper = current
            .downcast_ref::<TransportError>()
            .is_some_and(TransportError::is_wrapper);
        match current.source() {
            Some(cause) if is_wrapper => current = cause,
            _ => return current,
        }
    }
    tracing::warn!(
        depth = MAX_CAUSE_DEPTH,
        "cause chain too deep, reporting the outer error"
    );
    error
}

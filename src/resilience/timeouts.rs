//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound a single call's handler chain by its route timeout
//! - Treat a zero timeout as "no deadline"
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The timed-out future is dropped, which cancels it at its next
//!   suspension point; work it already spawned elsewhere is not awaited
//! - Timeout errors are distinct from handler errors so they log differently

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0}ms elapsed")]
pub struct DeadlineElapsed(pub u64);

pub async fn with_timeout<F: Future>(timeout_ms: u64, fut: F) -> Result<F::Output, DeadlineElapsed> {
    if timeout_ms == 0 {
        return Ok(fut.await);
    }
    tokio::time::timeout(Duration::from_millis(timeout_ms), fut)
        .await
        .map_err(|_| DeadlineElapsed(timeout_ms))
}

// SPDX-License-Identifier: Apache-2.0

//! Bounded condition polling and optimistic-concurrency retry.
//!
//! Every wait in the install pipeline goes through [`poll_until`] so that
//! deadline expiry is always reported as `NotReady` and remote API failures
//! keep their own error. [`retry_on_conflict`] wraps read-modify-write
//! updates that another controller may race on.

use crate::error::{InstallerError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Polls `condition` at a fixed interval until it reports done or `deadline`
/// elapses. The first check runs immediately. A condition error aborts the
/// poll and is returned as-is; expiry returns `NotReady` describing `what`.
pub async fn poll_until<F, Fut>(
    interval: Duration,
    deadline: Duration,
    what: &str,
    mut condition: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let poll = async {
        loop {
            if condition().await? {
                return Ok(());
            }
            sleep(interval).await;
        }
    };

    match timeout(deadline, poll).await {
        Ok(result) => result,
        Err(_) => Err(InstallerError::NotReady(what.to_string())),
    }
}

/// Runs `op` until it succeeds or fails with something other than a
/// resource-version conflict (HTTP 409), backing off between attempts.
/// After `max_attempts` the last conflict is surfaced unchanged.
pub async fn retry_on_conflict<T, F, Fut>(
    max_attempts: u32,
    base_backoff: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = base_backoff;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(e) if e.is_conflict() && attempt < max_attempts => {
                debug!(
                    "Conflicting update (attempt {}/{}), retrying in {:?}",
                    attempt, max_attempts, backoff
                );
                sleep(backoff).await;
                backoff *= 2;
            }
            other => return other,
        }
    }
}

// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use std::time::Duration;

use campus_checkin_store::{StoreError, StoreErrorCode};
use tokio::time::timeout;

pub mod registration;
pub mod session;
pub mod verifier;

/// Why a bounded ledger call did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerFault {
    Timeout { timeout_ms: u64 },
    Store(StoreError),
}

impl LedgerFault {
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Store(e) if e.code == StoreErrorCode::Disconnected)
    }
}

impl std::fmt::Display for LedgerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { timeout_ms } => write!(f, "ledger timed out after {timeout_ms}ms"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LedgerFault {}

pub(crate) fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

/// Runs one ledger call under `limit`. The call is abandoned, not cancelled
/// server side, when the limit fires.
pub(crate) async fn bounded<T, F>(limit: Duration, work: F) -> Result<T, LedgerFault>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match timeout(limit, work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(LedgerFault::Store(e)),
        Err(_) => Err(LedgerFault::Timeout {
            timeout_ms: millis(limit),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_work_becomes_timeout() {
        let out: Result<(), LedgerFault> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert_eq!(out, Err(LedgerFault::Timeout { timeout_ms: 10 }));
    }

    #[tokio::test]
    async fn store_errors_pass_through() {
        let out: Result<(), LedgerFault> = bounded(Duration::from_secs(1), async {
            Err(StoreError::disconnected("gone"))
        })
        .await;
        let fault = out.expect_err("fault");
        assert!(fault.is_disconnect());
    }
}

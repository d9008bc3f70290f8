//! Credits ledger with optimistic concurrency.
//!
//! Each chat turn costs credits. Deduction uses compare-and-swap over the
//! user's balance with a short retry loop, so two concurrent turns cannot
//! double-spend: the loser of the race re-reads the new balance and either
//! retries or reports insufficient funds.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use time::OffsetDateTime;

const MAX_SPEND_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// A single entry in the credit audit log.
#[derive(Debug, Clone)]
pub struct CreditLog {
    pub user_id: String,
    /// Signed delta: negative for deductions, positive for top-ups.
    pub amount: i64,
    /// Balance after the change.
    pub balance: i64,
    pub reason: String,
    pub at: OffsetDateTime,
}

/// Outcome of a spend attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendOutcome {
    Spent { remaining: i64 },
    InsufficientCredits { current: i64 },
    /// Every attempt lost a concurrent update race.
    Conflicted,
}

/// Trait for the account credits ledger.
///
/// Implementors provide balance reads and an atomic compare-and-swap;
/// [`CreditLedger::spend`] and [`CreditLedger::add`] build the retry loops
/// on top.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance for a user.
    ///
    /// # Errors
    /// Returns an error if the balance cannot be read.
    async fn balance(&self, user_id: &str) -> Result<i64>;

    /// Set the balance to `new` only if it still equals `expected`.
    /// Returns whether the swap applied.
    ///
    /// # Errors
    /// Returns an error if the ledger cannot be reached.
    async fn compare_and_swap(&self, user_id: &str, expected: i64, new: i64) -> Result<bool>;

    /// Record an audit log entry.
    ///
    /// # Errors
    /// Returns an error if the entry cannot be stored.
    async fn record(&self, entry: CreditLog) -> Result<()>;

    /// Deduct `amount` credits, retrying on concurrent updates.
    ///
    /// A failed audit-log write never rolls back a successful deduction.
    ///
    /// # Errors
    /// Returns an error only if the ledger itself is unreachable.
    async fn spend(&self, user_id: &str, amount: i64, reason: &str) -> Result<SpendOutcome> {
        for attempt in 0..MAX_SPEND_ATTEMPTS {
            let current = self.balance(user_id).await?;
            if current < amount {
                return Ok(SpendOutcome::InsufficientCredits { current });
            }

            let new_balance = current - amount;
            if self
                .compare_and_swap(user_id, current, new_balance)
                .await?
            {
                let entry = CreditLog {
                    user_id: user_id.to_owned(),
                    amount: -amount,
                    balance: new_balance,
                    reason: reason.to_owned(),
                    at: OffsetDateTime::now_utc(),
                };
                if let Err(e) = self.record(entry).await {
                    log::warn!("failed to record credit log (deduction kept): {e:#}");
                }
                return Ok(SpendOutcome::Spent {
                    remaining: new_balance,
                });
            }

            log::debug!(
                "credit deduction for {user_id} lost an update race, attempt {}",
                attempt + 1
            );
            tokio::time::sleep(RETRY_BASE_DELAY * (attempt + 1)).await;
        }

        Ok(SpendOutcome::Conflicted)
    }

    /// Add `amount` credits, retrying on concurrent updates.
    ///
    /// # Errors
    /// Returns an error if the ledger is unreachable or every attempt
    /// conflicts.
    async fn add(&self, user_id: &str, amount: i64, reason: &str) -> Result<i64> {
        for attempt in 0..MAX_SPEND_ATTEMPTS {
            let current = self.balance(user_id).await?;
            let new_balance = current + amount;
            if self
                .compare_and_swap(user_id, current, new_balance)
                .await?
            {
                let entry = CreditLog {
                    user_id: user_id.to_owned(),
                    amount,
                    balance: new_balance,
                    reason: reason.to_owned(),
                    at: OffsetDateTime::now_utc(),
                };
                if let Err(e) = self.record(entry).await {
                    log::warn!("failed to record credit log (top-up kept): {e:#}");
                }
                return Ok(new_balance);
            }
            tokio::time::sleep(RETRY_BASE_DELAY * (attempt + 1)).await;
        }

        bail!("credit top-up for {user_id} kept conflicting, giving up")
    }
}

/// In-memory implementation of [`CreditLedger`].
/// Useful for testing and simple use cases.
#[derive(Default)]
pub struct InMemoryLedger {
    balances: RwLock<HashMap<String, i64>>,
    logs: RwLock<Vec<CreditLog>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user balance (test and bootstrap helper).
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn set_balance(&self, user_id: &str, balance: i64) -> Result<()> {
        self.balances
            .write()
            .ok()
            .context("lock poisoned")?
            .insert(user_id.to_owned(), balance);
        Ok(())
    }

    /// Snapshot of the audit log.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn logs(&self) -> Result<Vec<CreditLog>> {
        Ok(self.logs.read().ok().context("lock poisoned")?.clone())
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn balance(&self, user_id: &str) -> Result<i64> {
        let balances = self.balances.read().ok().context("lock poisoned")?;
        Ok(balances.get(user_id).copied().unwrap_or(0))
    }

    async fn compare_and_swap(&self, user_id: &str, expected: i64, new: i64) -> Result<bool> {
        let mut balances = self.balances.write().ok().context("lock poisoned")?;
        let current = balances.entry(user_id.to_owned()).or_insert(0);
        if *current == expected {
            *current = new;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn record(&self, entry: CreditLog) -> Result<()> {
        self.logs
            .write()
            .ok()
            .context("lock poisoned")?
            .push(entry);
        Ok(())
    }
}

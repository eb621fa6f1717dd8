//! Balance engine
//!
//! Applies signed deltas to an account document and triggers the matching
//! transaction log entry as one logical update. The ordering is load-bearing:
//! validate the new balance, record the log entry, then commit the balance.
//! A log entry is therefore never written without the balance mutation
//! landing immediately after it, and a balance is never mutated twice for
//! the same (subject, action, action-entity-id) triple.

use crate::{
    error::{Error, Result},
    keyspace::Subject,
    store::Store,
    txlog::TransactionLog,
    types::{OpContext, Treasure, Wallet},
};
use rust_decimal::Decimal;

/// Apply a signed delta to the subject's balance, enforcing non-negativity
/// and idempotency.
///
/// Failure modes, all with no store write:
/// - `NotFound`: the account document is absent
/// - `InsufficientFunds`: the new balance would be negative
/// - `AlreadyRecorded`: the triple was already applied
pub fn apply_delta(
    store: &Store,
    subject: &Subject<'_>,
    delta: Decimal,
    tx_type: &str,
    action: &str,
    action_entity_id: &str,
    ctx: &OpContext,
) -> Result<()> {
    let key = subject.account_key()?;

    match subject {
        Subject::Wallet(_) => {
            let mut wallet: Wallet = store
                .get_json(&key)?
                .ok_or_else(|| Error::NotFound(format!("{} not found", subject.describe())))?;

            let new_balance = check_balance(subject, wallet.amount, delta)?;
            TransactionLog::new(store)
                .record(subject, action, action_entity_id, delta, tx_type, ctx)?;

            wallet.amount = new_balance;
            store.put_json(&key, &wallet)?;
        }
        Subject::Treasure(_) => {
            let mut treasure: Treasure = store
                .get_json(&key)?
                .ok_or_else(|| Error::NotFound(format!("{} not found", subject.describe())))?;

            let new_balance = check_balance(subject, treasure.balance, delta)?;
            TransactionLog::new(store)
                .record(subject, action, action_entity_id, delta, tx_type, ctx)?;

            treasure.balance = new_balance;
            store.put_json(&key, &treasure)?;
        }
    }

    tracing::debug!(
        subject = %subject.describe(),
        %delta,
        tx_type,
        "Balance updated"
    );

    Ok(())
}

fn check_balance(subject: &Subject<'_>, current: Decimal, delta: Decimal) -> Result<Decimal> {
    let new_balance = current + delta;
    if new_balance < Decimal::ZERO {
        return Err(Error::InsufficientFunds(format!(
            "insufficient funds on {}",
            subject.describe()
        )));
    }
    Ok(new_balance)
}

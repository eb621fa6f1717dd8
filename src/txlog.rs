//! Append-only transaction log
//!
//! One immutable record per successful balance-affecting action. The record
//! key is the (subject, action, action-entity-id) triple, which doubles as
//! the double-submission guard: once a triple is recorded it stays recorded,
//! and any later attempt fails with `AlreadyRecorded`.

use crate::{
    error::{Error, Result},
    keyspace::Subject,
    store::Store,
    types::{DocType, OpContext, TreasureTransaction, WalletTransaction},
};
use rust_decimal::Decimal;

/// Transaction log over the document store
pub struct TransactionLog<'a> {
    store: &'a Store,
}

impl<'a> TransactionLog<'a> {
    /// Create a log view over the store
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Record one economic event against a wallet or the treasure.
    ///
    /// Performs exactly one store write, or none: if a record already exists
    /// for the triple the call fails with `AlreadyRecorded` and nothing is
    /// written. Callers surface that as a conflict, not a fatal failure.
    pub fn record(
        &self,
        subject: &Subject<'_>,
        action: &str,
        action_entity_id: &str,
        amount: Decimal,
        tx_type: &str,
        ctx: &OpContext,
    ) -> Result<()> {
        let key = subject.transaction_key(action, action_entity_id)?;

        if self.store.exists(&key)? {
            return Err(Error::AlreadyRecorded(format!(
                "transaction with action {} and action entity {} already exists for {}",
                action,
                action_entity_id,
                subject.describe()
            )));
        }

        let creation_date = chrono::Utc::now().timestamp();

        match subject {
            Subject::Wallet(wallet_id) => {
                let record = WalletTransaction {
                    doc_type: DocType::WalletTransaction,
                    wallet_id: wallet_id.to_string(),
                    tx_id: ctx.txn_id.clone(),
                    tx_type: tx_type.to_string(),
                    action: action.to_string(),
                    action_entity_id: action_entity_id.to_string(),
                    amount,
                    creation_date,
                    customer: ctx.customer.clone(),
                };
                self.store.put_json(&key, &record)?;
            }
            Subject::Treasure(_) => {
                let record = TreasureTransaction {
                    doc_type: DocType::TreasureTransaction,
                    tx_id: ctx.txn_id.clone(),
                    tx_type: tx_type.to_string(),
                    action: action.to_string(),
                    action_entity_id: action_entity_id.to_string(),
                    amount,
                    creation_date,
                    customer: ctx.customer.clone(),
                };
                self.store.put_json(&key, &record)?;
            }
        }

        tracing::debug!(
            subject = %subject.describe(),
            action,
            action_entity_id,
            %amount,
            tx_type,
            "Transaction recorded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocType;
    use crate::Config;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Store::open(&config).unwrap(), temp_dir)
    }

    fn test_ctx() -> OpContext {
        OpContext {
            txn_id: "txn-1".to_string(),
            customer: "default".to_string(),
            treasure_id: "treasure".to_string(),
        }
    }

    #[test]
    fn test_record_wallet_transaction() {
        let (store, _temp) = test_store();
        let log = TransactionLog::new(&store);

        log.record(
            &Subject::Wallet("w1"),
            "MAGIC_BOX",
            "BOX_1",
            Decimal::from(200),
            "purchase",
            &test_ctx(),
        )
        .unwrap();

        let key = Subject::Wallet("w1")
            .transaction_key("MAGIC_BOX", "BOX_1")
            .unwrap();
        let record: WalletTransaction = store.get_json(&key).unwrap().unwrap();
        assert_eq!(record.doc_type, DocType::WalletTransaction);
        assert_eq!(record.wallet_id, "w1");
        assert_eq!(record.tx_id, "txn-1");
        assert_eq!(record.amount, Decimal::from(200));
        assert!(record.creation_date > 0);
    }

    #[test]
    fn test_duplicate_triple_rejected() {
        let (store, _temp) = test_store();
        let log = TransactionLog::new(&store);
        let ctx = test_ctx();

        log.record(
            &Subject::Wallet("w1"),
            "MAGIC_BOX",
            "BOX_1",
            Decimal::from(200),
            "purchase",
            &ctx,
        )
        .unwrap();

        let second = log.record(
            &Subject::Wallet("w1"),
            "MAGIC_BOX",
            "BOX_1",
            Decimal::from(200),
            "purchase",
            &ctx,
        );
        assert!(matches!(second, Err(Error::AlreadyRecorded(_))));

        // The original record is untouched.
        let key = Subject::Wallet("w1")
            .transaction_key("MAGIC_BOX", "BOX_1")
            .unwrap();
        let record: WalletTransaction = store.get_json(&key).unwrap().unwrap();
        assert_eq!(record.tx_id, "txn-1");
    }

    #[test]
    fn test_wallet_and_treasure_guards_are_independent() {
        let (store, _temp) = test_store();
        let log = TransactionLog::new(&store);
        let ctx = test_ctx();

        // Same action pair on both subjects: both succeed.
        log.record(
            &Subject::Treasure("treasure"),
            "MAGIC_BOX",
            "BOX_1",
            Decimal::from(-200),
            "purchase",
            &ctx,
        )
        .unwrap();

        log.record(
            &Subject::Wallet("w1"),
            "MAGIC_BOX",
            "BOX_1",
            Decimal::from(200),
            "purchase",
            &ctx,
        )
        .unwrap();
    }

    #[test]
    fn test_different_entities_do_not_collide() {
        let (store, _temp) = test_store();
        let log = TransactionLog::new(&store);
        let ctx = test_ctx();

        for entity in ["BOX_1", "BOX_2", "BOX_3"] {
            log.record(
                &Subject::Wallet("w1"),
                "MAGIC_BOX",
                entity,
                Decimal::from(10),
                "purchase",
                &ctx,
            )
            .unwrap();
        }
    }
}

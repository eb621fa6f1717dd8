//! Main ledger orchestration layer
//!
//! Ties the store, transaction log, and balance engine into the high-level
//! account operations: wallet and treasure lifecycle plus the two compound
//! transfers (purchase: treasure → wallet, spend: wallet → treasure).
//!
//! # Example
//!
//! ```no_run
//! use coin_ledger::{Config, Ledger};
//!
//! fn main() -> coin_ledger::Result<()> {
//!     let config = Config::default();
//!     let ledger = Ledger::open(config)?;
//!     ledger.init(None, None)?;
//!
//!     let wallet = ledger.create_wallet("w1", "hash1", None, None, None, None)?;
//!     println!("wallet balance: {}", wallet.amount);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    balance,
    error::{Error, Result},
    keyspace::{CompositeKey, Subject},
    query::{self, Page},
    store::Store,
    txlog::TransactionLog,
    types::{DocType, OpContext, Options, Treasure, Wallet},
    Config,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Economic type tag for wallet registration
pub const TX_REGISTRATION: &str = "registration";
/// Economic type tag for treasure-to-wallet transfers
pub const TX_PURCHASE: &str = "purchase";
/// Economic type tag for wallet-to-treasure transfers
pub const TX_SPEND: &str = "spend";
/// Economic type tag for credential updates
pub const TX_MOBILE_UPDATE: &str = "mobile update";
/// Economic type tag for treasure creation
pub const TX_CREATE_TREASURE: &str = "createTreasure";

/// Action label for credential updates
const MOBILE_UPDATE_ACTION: &str = "MOBILE_UPDATE";
/// Fixed action pair for the treasure genesis entry
const GENESIS_ACTION: &str = "genesis";
const GENESIS_ACTION_ENTITY_ID: &str = "genesis";
/// First key attribute of every options record
const OPTIONS_ID: &str = "Options";

/// Main ledger interface
pub struct Ledger {
    /// Document store
    store: Arc<Store>,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with configuration
    pub fn open(config: Config) -> Result<Self> {
        let store = Arc::new(Store::open(&config)?);
        Ok(Self { store, config })
    }

    /// Direct store access (for queries and tests)
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Configuration this ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the per-invocation context once at call entry.
    fn ctx(&self, customer: Option<&str>) -> OpContext {
        let customer = match customer {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => self.config.defaults.customer.clone(),
        };

        OpContext {
            txn_id: Uuid::now_v7().to_string(),
            customer,
            treasure_id: self.config.defaults.treasure_id.clone(),
        }
    }

    /// Bootstrap the ledger: create the treasure and write the default
    /// options record.
    pub fn init(
        &self,
        treasure_balance: Option<Decimal>,
        registration_amount: Option<Decimal>,
    ) -> Result<()> {
        let balance = treasure_balance.unwrap_or(self.config.defaults.treasure_balance);
        self.create_treasure(Some(balance), None)?;

        let registration = registration_amount.unwrap_or(self.config.defaults.registration_amount);
        self.set_options(registration, None)?;

        tracing::info!(%balance, %registration, "Ledger initialized");
        Ok(())
    }

    // Treasure lifecycle

    /// Create a treasure reserve account and record its genesis log entry.
    ///
    /// The genesis entry goes through the double-submission guard before the
    /// document is written, so re-creating an existing treasure ID conflicts
    /// and leaves its balance untouched.
    pub fn create_treasure(
        &self,
        balance: Option<Decimal>,
        treasure_id: Option<&str>,
    ) -> Result<Treasure> {
        let ctx = self.ctx(None);
        let id = match treasure_id {
            Some(t) if !t.is_empty() => t,
            _ => &ctx.treasure_id,
        };

        let balance = balance.unwrap_or(self.config.defaults.treasure_balance);
        if balance < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "treasure balance must not be negative: {}",
                balance
            )));
        }

        let subject = Subject::Treasure(id);
        TransactionLog::new(&self.store).record(
            &subject,
            GENESIS_ACTION,
            GENESIS_ACTION_ENTITY_ID,
            balance,
            TX_CREATE_TREASURE,
            &ctx,
        )?;

        let treasure = Treasure {
            doc_type: DocType::Treasure,
            balance,
        };
        self.store.put_json(&subject.account_key()?, &treasure)?;

        tracing::info!(treasure_id = id, %balance, "Treasure created");
        Ok(treasure)
    }

    /// Read a treasure document; absent is not an error.
    pub fn get_treasure(&self, treasure_id: Option<&str>) -> Result<Option<Treasure>> {
        let id = match treasure_id {
            Some(t) if !t.is_empty() => t,
            _ => &self.config.defaults.treasure_id,
        };
        self.store.get_json(&Subject::Treasure(id).account_key()?)
    }

    // Wallet lifecycle

    /// Create a wallet funded by the treasure.
    ///
    /// The registration amount comes from the explicit argument or from the
    /// customer's options record. The treasure debit and the wallet-side
    /// registration entry both go through the double-submission guard; a
    /// repeat surfaces as `AlreadyRecorded`.
    pub fn create_wallet(
        &self,
        id: &str,
        mobile_hash: &str,
        amount: Option<Decimal>,
        action: Option<&str>,
        action_entity_id: Option<&str>,
        customer: Option<&str>,
    ) -> Result<Wallet> {
        if id.is_empty() {
            return Err(Error::Validation("wallet id must not be empty".to_string()));
        }

        let ctx = self.ctx(customer);
        let subject = Subject::Wallet(id);
        let key = subject.account_key()?;

        if self.store.exists(&key)? {
            return Err(Error::AlreadyExists(format!(
                "wallet with id {} already exists",
                id
            )));
        }

        let amount = match amount {
            Some(a) if a < Decimal::ZERO => {
                return Err(Error::Validation(format!(
                    "registration amount must not be negative: {}",
                    a
                )))
            }
            Some(a) => a,
            None => self.registration_amount(&ctx.customer)?,
        };

        let action = action.unwrap_or(TX_REGISTRATION);
        // Defaulting the entity to the wallet ID keeps default-argument
        // creations from colliding on the treasure log.
        let action_entity_id = action_entity_id.unwrap_or(id);

        balance::apply_delta(
            &self.store,
            &Subject::Treasure(&ctx.treasure_id),
            -amount,
            TX_REGISTRATION,
            action,
            action_entity_id,
            &ctx,
        )?;

        TransactionLog::new(&self.store).record(
            &subject,
            action,
            action_entity_id,
            amount,
            TX_REGISTRATION,
            &ctx,
        )?;

        let wallet = Wallet {
            doc_type: DocType::Wallet,
            id: id.to_string(),
            amount,
            mobile_hash: mobile_hash.to_string(),
        };
        self.store.put_json(&key, &wallet)?;

        tracing::info!(wallet_id = id, %amount, customer = %ctx.customer, "Wallet created");
        Ok(wallet)
    }

    /// Read a wallet document; absent is not an error.
    pub fn get_wallet(&self, id: &str) -> Result<Option<Wallet>> {
        self.store.get_json(&Subject::Wallet(id).account_key()?)
    }

    /// Rewrite a wallet's credential fingerprint and log a zero-amount entry.
    ///
    /// The entry is keyed by a freshly generated action-entity-id (hash plus
    /// timestamp) so repeated updates never trip the idempotency guard.
    pub fn update_wallet_mobile_hash(&self, id: &str, mobile_hash: &str) -> Result<Wallet> {
        let ctx = self.ctx(None);
        let subject = Subject::Wallet(id);
        let key = subject.account_key()?;

        let mut wallet: Wallet = self
            .store
            .get_json(&key)?
            .ok_or_else(|| Error::NotFound(format!("wallet with id {} not found", id)))?;

        let action_entity_id = format!(
            "{}|{}",
            mobile_hash,
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );

        TransactionLog::new(&self.store).record(
            &subject,
            MOBILE_UPDATE_ACTION,
            &action_entity_id,
            Decimal::ZERO,
            TX_MOBILE_UPDATE,
            &ctx,
        )?;

        wallet.mobile_hash = mobile_hash.to_string();
        self.store.put_json(&key, &wallet)?;

        tracing::info!(wallet_id = id, "Wallet mobile hash updated");
        Ok(wallet)
    }

    // Compound transfers

    /// Transfer from treasure to wallet: debit treasure, then credit wallet.
    ///
    /// Both legs carry the same action pair; each side's guard is evaluated
    /// independently. The first leg is not rolled back if the second fails;
    /// operators reconcile via the transaction log audit trail.
    pub fn purchase_coins(
        &self,
        wallet_id: &str,
        amount: Decimal,
        action: &str,
        action_entity_id: &str,
        customer: Option<&str>,
    ) -> Result<()> {
        let ctx = self.ctx(customer);
        check_transfer_amount(amount)?;

        balance::apply_delta(
            &self.store,
            &Subject::Treasure(&ctx.treasure_id),
            -amount,
            TX_PURCHASE,
            action,
            action_entity_id,
            &ctx,
        )?;

        balance::apply_delta(
            &self.store,
            &Subject::Wallet(wallet_id),
            amount,
            TX_PURCHASE,
            action,
            action_entity_id,
            &ctx,
        )?;

        tracing::info!(wallet_id, %amount, action, "Coins purchased");
        Ok(())
    }

    /// Transfer from wallet to treasure: debit wallet, then credit treasure.
    pub fn spend_coins(
        &self,
        wallet_id: &str,
        amount: Decimal,
        action: &str,
        action_entity_id: &str,
        customer: Option<&str>,
    ) -> Result<()> {
        let ctx = self.ctx(customer);
        check_transfer_amount(amount)?;

        balance::apply_delta(
            &self.store,
            &Subject::Wallet(wallet_id),
            -amount,
            TX_SPEND,
            action,
            action_entity_id,
            &ctx,
        )?;

        balance::apply_delta(
            &self.store,
            &Subject::Treasure(&ctx.treasure_id),
            amount,
            TX_SPEND,
            action,
            action_entity_id,
            &ctx,
        )?;

        tracing::info!(wallet_id, %amount, action, "Coins spent");
        Ok(())
    }

    // Options

    /// Write the options record for a customer namespace.
    pub fn set_options(&self, registration: Decimal, customer: Option<&str>) -> Result<Options> {
        let ctx = self.ctx(customer);

        let options = Options {
            doc_type: DocType::Options,
            registration,
            customer: ctx.customer.clone(),
        };
        let key = options_key(&ctx.customer)?;
        self.store.put_json(&key, &options)?;

        tracing::info!(customer = %ctx.customer, %registration, "Options written");
        Ok(options)
    }

    /// Read the options record for a customer namespace.
    ///
    /// Bounded two-step lookup: the customer-specific record first, then the
    /// default namespace.
    pub fn get_options(&self, customer: Option<&str>) -> Result<Option<Options>> {
        let default = &self.config.defaults.customer;
        let customer = match customer {
            Some(c) if !c.is_empty() => c,
            _ => default,
        };

        if let Some(options) = self.store.get_json(&options_key(customer)?)? {
            return Ok(Some(options));
        }

        if customer != default {
            return self.store.get_json(&options_key(default)?);
        }

        Ok(None)
    }

    fn registration_amount(&self, customer: &str) -> Result<Decimal> {
        let options = self.get_options(Some(customer))?.ok_or_else(|| {
            Error::NotFound(format!(
                "no options record for customer {} or the default namespace",
                customer
            ))
        })?;
        Ok(options.registration)
    }

    // Query projection

    /// Search wallet documents
    pub fn search_wallets(
        &self,
        filter: Option<&serde_json::Map<String, Value>>,
        page: Option<Page>,
    ) -> Result<Vec<Value>> {
        query::search(&self.store, DocType::Wallet, filter, page)
    }

    /// Search wallet transaction documents
    pub fn search_wallet_transactions(
        &self,
        filter: Option<&serde_json::Map<String, Value>>,
        page: Option<Page>,
    ) -> Result<Vec<Value>> {
        query::search(&self.store, DocType::WalletTransaction, filter, page)
    }

    /// Search treasure transaction documents
    pub fn search_treasure_transactions(
        &self,
        filter: Option<&serde_json::Map<String, Value>>,
        page: Option<Page>,
    ) -> Result<Vec<Value>> {
        query::search(&self.store, DocType::TreasureTransaction, filter, page)
    }
}

fn check_transfer_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "transfer amount must be positive: {}",
            amount
        )));
    }
    Ok(())
}

fn options_key(customer: &str) -> Result<CompositeKey> {
    CompositeKey::new(DocType::Options, &[OPTIONS_ID, customer])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ledger() -> (Ledger, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let ledger = Ledger::open(config).unwrap();
        ledger.init(None, None).unwrap();
        (ledger, temp_dir)
    }

    #[test]
    fn test_init_creates_treasure_and_options() {
        let (ledger, _temp) = test_ledger();

        let treasure = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(treasure.balance, Decimal::from(210_000_000u64));

        let options = ledger.get_options(None).unwrap().unwrap();
        assert_eq!(options.registration, Decimal::from(110u64));
    }

    #[test]
    fn test_create_wallet_with_explicit_amount() {
        let (ledger, _temp) = test_ledger();

        let wallet = ledger
            .create_wallet("w1", "hash1", Some(Decimal::from(50)), None, None, None)
            .unwrap();
        assert_eq!(wallet.amount, Decimal::from(50));
        assert_eq!(wallet.mobile_hash, "hash1");

        let read_back = ledger.get_wallet("w1").unwrap().unwrap();
        assert_eq!(read_back, wallet);

        let treasure = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(treasure.balance, Decimal::from(209_999_950u64));
    }

    #[test]
    fn test_create_wallet_uses_registration_default() {
        let (ledger, _temp) = test_ledger();

        let wallet = ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();
        assert_eq!(wallet.amount, Decimal::from(110));

        let treasure = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(treasure.balance, Decimal::from(209_999_890u64));
    }

    #[test]
    fn test_create_wallet_exactly_once() {
        let (ledger, _temp) = test_ledger();

        let first = ledger
            .create_wallet("w1", "hash1", Some(Decimal::from(10)), None, None, None)
            .unwrap();

        let second = ledger.create_wallet("w1", "hash2", Some(Decimal::from(99)), None, None, None);
        assert!(matches!(second, Err(Error::AlreadyExists(_))));

        // First wallet unmodified by the failed attempt.
        let read_back = ledger.get_wallet("w1").unwrap().unwrap();
        assert_eq!(read_back, first);
    }

    #[test]
    fn test_default_creations_do_not_collide() {
        let (ledger, _temp) = test_ledger();

        // Two default-argument creations must both succeed: the treasure-side
        // guard keys include the wallet ID.
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();
        ledger
            .create_wallet("w2", "hash2", None, None, None, None)
            .unwrap();
    }

    #[test]
    fn test_registration_records_both_log_entries() {
        let (ledger, _temp) = test_ledger();
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();

        let wallet_txns = ledger.search_wallet_transactions(None, None).unwrap();
        assert_eq!(wallet_txns.len(), 1);
        assert_eq!(wallet_txns[0]["type"], "registration");
        assert_eq!(wallet_txns[0]["walletId"], "w1");

        let filter = serde_json::json!({"type": "registration"});
        let treasure_txns = ledger
            .search_treasure_transactions(filter.as_object(), None)
            .unwrap();
        assert_eq!(treasure_txns.len(), 1);
        assert_eq!(treasure_txns[0]["amount"], serde_json::json!(-110.0));
    }

    #[test]
    fn test_purchase_and_spend_round_trip() {
        let (ledger, _temp) = test_ledger();
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();

        ledger
            .purchase_coins("w1", Decimal::from(200), "MAGIC_BOX", "BOX_1", None)
            .unwrap();
        let wallet = ledger.get_wallet("w1").unwrap().unwrap();
        assert_eq!(wallet.amount, Decimal::from(310));

        ledger
            .spend_coins("w1", Decimal::from(60), "MAGIC_SWORD", "SWORD_1", None)
            .unwrap();
        let wallet = ledger.get_wallet("w1").unwrap().unwrap();
        assert_eq!(wallet.amount, Decimal::from(250));

        // Treasure is back down 110 (registration) + 200 - 60.
        let treasure = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(treasure.balance, Decimal::from(209_999_750u64));
    }

    #[test]
    fn test_repeated_purchase_conflicts_without_double_apply() {
        let (ledger, _temp) = test_ledger();
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();

        ledger
            .purchase_coins("w1", Decimal::from(200), "MAGIC_BOX", "BOX_1", None)
            .unwrap();

        let second = ledger.purchase_coins("w1", Decimal::from(200), "MAGIC_BOX", "BOX_1", None);
        assert!(matches!(second, Err(Error::AlreadyRecorded(_))));

        let wallet = ledger.get_wallet("w1").unwrap().unwrap();
        assert_eq!(wallet.amount, Decimal::from(310));
        let treasure = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(treasure.balance, Decimal::from(209_999_690u64));
    }

    #[test]
    fn test_spend_insufficient_funds_has_no_side_effect() {
        let (ledger, _temp) = test_ledger();
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();
        ledger
            .purchase_coins("w1", Decimal::from(200), "MAGIC_BOX", "BOX_1", None)
            .unwrap();

        let result = ledger.spend_coins("w1", Decimal::from(1000), "X", "Y", None);
        assert!(matches!(result, Err(Error::InsufficientFunds(_))));

        let wallet = ledger.get_wallet("w1").unwrap().unwrap();
        assert_eq!(wallet.amount, Decimal::from(310));

        // No log entry was created for the rejected action.
        let filter = serde_json::json!({"action": "X"});
        let txns = ledger
            .search_wallet_transactions(filter.as_object(), None)
            .unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn test_spend_to_missing_wallet() {
        let (ledger, _temp) = test_ledger();
        let result = ledger.spend_coins("ghost", Decimal::from(5), "a", "e", None);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_mobile_hash_updates_never_collide() {
        let (ledger, _temp) = test_ledger();
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();

        let updated = ledger.update_wallet_mobile_hash("w1", "hash2").unwrap();
        assert_eq!(updated.mobile_hash, "hash2");

        // Same hash again: fresh action-entity-id, no conflict.
        let again = ledger.update_wallet_mobile_hash("w1", "hash2").unwrap();
        assert_eq!(again.mobile_hash, "hash2");

        // Balance untouched by credential updates.
        assert_eq!(again.amount, Decimal::from(110));
    }

    #[test]
    fn test_get_wallet_absent_is_none() {
        let (ledger, _temp) = test_ledger();
        assert!(ledger.get_wallet("missing").unwrap().is_none());
        assert!(ledger.get_treasure(Some("other")).unwrap().is_none());
    }

    #[test]
    fn test_options_customer_fallback() {
        let (ledger, _temp) = test_ledger();

        // Unknown customer falls back to the default namespace record.
        let options = ledger.get_options(Some("acme")).unwrap().unwrap();
        assert_eq!(options.customer, "default");

        // A customer-specific record takes precedence once written.
        ledger
            .set_options(Decimal::from(25), Some("acme"))
            .unwrap();
        let options = ledger.get_options(Some("acme")).unwrap().unwrap();
        assert_eq!(options.customer, "acme");
        assert_eq!(options.registration, Decimal::from(25));

        // Wallet creation under that customer uses its registration amount.
        let wallet = ledger
            .create_wallet("w1", "hash1", None, None, None, Some("acme"))
            .unwrap();
        assert_eq!(wallet.amount, Decimal::from(25));
    }

    #[test]
    fn test_create_treasure_under_new_id() {
        let (ledger, _temp) = test_ledger();

        let treasure = ledger
            .create_treasure(Some(Decimal::from(5000)), Some("vault-2"))
            .unwrap();
        assert_eq!(treasure.balance, Decimal::from(5000));

        let read_back = ledger.get_treasure(Some("vault-2")).unwrap().unwrap();
        assert_eq!(read_back.balance, Decimal::from(5000));

        // The default treasure is untouched.
        let default = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(default.balance, Decimal::from(210_000_000u64));
    }

    #[test]
    fn test_recreate_same_treasure_conflicts() {
        let (ledger, _temp) = test_ledger();
        // init already created the default treasure; the genesis entry for
        // the same ID is terminal.
        let result = ledger.create_treasure(Some(Decimal::from(1)), None);
        assert!(matches!(result, Err(Error::AlreadyRecorded(_))));

        // The conflict must not touch the existing reserve balance.
        let treasure = ledger.get_treasure(None).unwrap().unwrap();
        assert_eq!(treasure.balance, Decimal::from(210_000_000u64));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let (ledger, _temp) = test_ledger();
        ledger
            .create_wallet("w1", "hash1", None, None, None, None)
            .unwrap();

        let purchase = ledger.purchase_coins("w1", Decimal::from(-5), "a", "e", None);
        assert!(matches!(purchase, Err(Error::Validation(_))));

        let spend = ledger.spend_coins("w1", Decimal::ZERO, "a", "e", None);
        assert!(matches!(spend, Err(Error::Validation(_))));

        let create = ledger.create_wallet("w2", "h", Some(Decimal::from(-1)), None, None, None);
        assert!(matches!(create, Err(Error::Validation(_))));
    }
}

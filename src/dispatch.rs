//! Dispatch surface
//!
//! Routes named operations with ordered string arguments to the ledger and
//! maps outcomes to `(payload, status, message)` responses: 200 success,
//! 409 conflict (already recorded), 500 everything else. Empty optional
//! arguments are treated as absent.

use crate::{
    error::{Error, Result},
    metrics::Metrics,
    query::{self, Page},
    Ledger,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

/// Response returned to the dispatcher collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// 200 success, 409 conflict, 500 failure
    pub status: u16,

    /// Human-readable message, empty on success
    pub message: String,

    /// Operation payload (JSON document, JSON array, or empty)
    pub payload: Vec<u8>,
}

impl Response {
    fn success(payload: Vec<u8>) -> Self {
        Self {
            status: 200,
            message: String::new(),
            payload,
        }
    }

    fn failure(err: &Error) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
            payload: Vec::new(),
        }
    }
}

/// Entry point routing named operations to ledger handlers
pub struct Dispatcher {
    ledger: Ledger,
    metrics: Metrics,
}

impl Dispatcher {
    /// Create a dispatcher over an opened ledger
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            metrics: Metrics::default(),
        }
    }

    /// The wrapped ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Dispatch metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Invoke a named operation
    pub fn invoke(&self, function: &str, args: &[String]) -> Response {
        tracing::info!(function, ?args, "Invoking ledger operation");
        let start = Instant::now();
        self.metrics.record_operation();

        let result = match function {
            "init" => self.handle_init(args),
            "createWallet" => self.handle_create_wallet(args),
            "getWallet" => self.handle_get_wallet(args),
            "updateWalletMobileHash" => self.handle_update_wallet_mobile_hash(args),
            "purchaseCoins" => self.handle_purchase_coins(args),
            "spendCoins" => self.handle_spend_coins(args),
            "createTreasure" => self.handle_create_treasure(args),
            "getTreasure" => self.handle_get_treasure(args),
            "searchWallets" => self.handle_search_wallets(args),
            "searchWalletTransactions" => self.handle_search_wallet_transactions(args),
            "searchTreasureTransactions" => self.handle_search_treasure_transactions(args),
            "setOptions" => self.handle_set_options(args),
            "getOptions" => self.handle_get_options(args),
            _ => Err(Error::Validation(format!(
                "invalid ledger function name: {}",
                function
            ))),
        };

        self.metrics.record_duration(start.elapsed().as_secs_f64());

        match result {
            Ok(payload) => Response::success(payload),
            Err(err) => {
                match err {
                    Error::AlreadyRecorded(_) => self.metrics.record_conflict(),
                    _ => self.metrics.record_failure(),
                }
                tracing::warn!(function, error = %err, "Ledger operation failed");
                Response::failure(&err)
            }
        }
    }

    fn handle_init(&self, args: &[String]) -> Result<Vec<u8>> {
        let treasure_balance = optional(args, 0).map(parse_amount).transpose()?;
        let registration = optional(args, 1).map(parse_amount).transpose()?;
        self.ledger.init(treasure_balance, registration)?;
        Ok(Vec::new())
    }

    fn handle_create_wallet(&self, args: &[String]) -> Result<Vec<u8>> {
        let id = required(args, 0, "wallet id")?;
        let mobile_hash = required(args, 1, "mobile hash")?;
        let amount = optional(args, 2).map(parse_amount).transpose()?;
        let action = optional(args, 3);
        let action_entity_id = optional(args, 4);
        let customer = optional(args, 5);

        let wallet = self.ledger.create_wallet(
            id,
            mobile_hash,
            amount,
            action,
            action_entity_id,
            customer,
        )?;
        Ok(serde_json::to_vec(&wallet)?)
    }

    fn handle_get_wallet(&self, args: &[String]) -> Result<Vec<u8>> {
        let id = required(args, 0, "wallet id")?;
        match self.ledger.get_wallet(id)? {
            Some(wallet) => Ok(serde_json::to_vec(&wallet)?),
            None => Ok(Vec::new()),
        }
    }

    fn handle_update_wallet_mobile_hash(&self, args: &[String]) -> Result<Vec<u8>> {
        let id = required(args, 0, "wallet id")?;
        let mobile_hash = required(args, 1, "mobile hash")?;
        let wallet = self.ledger.update_wallet_mobile_hash(id, mobile_hash)?;
        Ok(serde_json::to_vec(&wallet)?)
    }

    fn handle_purchase_coins(&self, args: &[String]) -> Result<Vec<u8>> {
        let (id, amount, action, entity, customer) = transfer_args(args)?;
        self.ledger
            .purchase_coins(id, amount, action, entity, customer)?;
        Ok(Vec::new())
    }

    fn handle_spend_coins(&self, args: &[String]) -> Result<Vec<u8>> {
        let (id, amount, action, entity, customer) = transfer_args(args)?;
        self.ledger
            .spend_coins(id, amount, action, entity, customer)?;
        Ok(Vec::new())
    }

    fn handle_create_treasure(&self, args: &[String]) -> Result<Vec<u8>> {
        let balance = optional(args, 0).map(parse_amount).transpose()?;
        let treasure_id = optional(args, 1);
        let treasure = self.ledger.create_treasure(balance, treasure_id)?;
        Ok(serde_json::to_vec(&treasure)?)
    }

    fn handle_get_treasure(&self, args: &[String]) -> Result<Vec<u8>> {
        let treasure_id = optional(args, 0);
        match self.ledger.get_treasure(treasure_id)? {
            Some(treasure) => Ok(serde_json::to_vec(&treasure)?),
            None => Ok(Vec::new()),
        }
    }

    fn handle_search_wallets(&self, args: &[String]) -> Result<Vec<u8>> {
        let (filter, page) = search_args(args)?;
        let matches = self.ledger.search_wallets(filter.as_ref(), page)?;
        query::to_json_array(&matches)
    }

    fn handle_search_wallet_transactions(&self, args: &[String]) -> Result<Vec<u8>> {
        let (filter, page) = search_args(args)?;
        let matches = self
            .ledger
            .search_wallet_transactions(filter.as_ref(), page)?;
        query::to_json_array(&matches)
    }

    fn handle_search_treasure_transactions(&self, args: &[String]) -> Result<Vec<u8>> {
        let (filter, page) = search_args(args)?;
        let matches = self
            .ledger
            .search_treasure_transactions(filter.as_ref(), page)?;
        query::to_json_array(&matches)
    }

    fn handle_set_options(&self, args: &[String]) -> Result<Vec<u8>> {
        let registration = parse_amount(required(args, 0, "registration amount")?)?;
        let customer = optional(args, 1);
        let options = self.ledger.set_options(registration, customer)?;
        Ok(serde_json::to_vec(&options)?)
    }

    fn handle_get_options(&self, args: &[String]) -> Result<Vec<u8>> {
        let customer = optional(args, 0);
        match self.ledger.get_options(customer)? {
            Some(options) => Ok(serde_json::to_vec(&options)?),
            None => Ok(Vec::new()),
        }
    }
}

// Argument helpers

fn required<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    match args.get(idx) {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => Err(Error::Validation(format!(
            "missing required argument: {}",
            name
        ))),
    }
}

fn optional(args: &[String], idx: usize) -> Option<&str> {
    args.get(idx).map(String::as_str).filter(|s| !s.is_empty())
}

fn parse_amount(s: &str) -> Result<Decimal> {
    s.parse()
        .map_err(|_| Error::Validation(format!("malformed amount: {}", s)))
}

fn transfer_args(args: &[String]) -> Result<(&str, Decimal, &str, &str, Option<&str>)> {
    let id = required(args, 0, "wallet id")?;
    let amount = parse_amount(required(args, 1, "amount")?)?;
    let action = required(args, 2, "action")?;
    let entity = required(args, 3, "action entity id")?;
    let customer = optional(args, 4);
    Ok((id, amount, action, entity, customer))
}

type SearchArgs = (Option<serde_json::Map<String, Value>>, Option<Page>);

fn search_args(args: &[String]) -> Result<SearchArgs> {
    let filter = match optional(args, 0) {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw)
                .map_err(|_| Error::Validation(format!("malformed filter JSON: {}", raw)))?;
            match value {
                Value::Object(map) => Some(map),
                _ => {
                    return Err(Error::Validation(
                        "filter must be a JSON object".to_string(),
                    ))
                }
            }
        }
        None => None,
    };

    let page = match (optional(args, 1), optional(args, 2)) {
        (Some(page), Some(size)) => {
            let page: u64 = page
                .parse()
                .map_err(|_| Error::Validation(format!("malformed page number: {}", page)))?;
            let page_size: u64 = size
                .parse()
                .map_err(|_| Error::Validation(format!("malformed page size: {}", size)))?;
            Some(Page { page, page_size })
        }
        _ => None,
    };

    Ok((filter, page))
}

//! Document types stored in the ledger
//!
//! Field names follow the stored JSON wire format, so documents written by
//! this crate remain searchable with the same predicate filters callers have
//! always used (`docType`, `walletId`, `actionEntityId`, ...).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document type tag, always the first composite-key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    /// Named account with a non-negative balance
    #[serde(rename = "wallet")]
    Wallet,
    /// Reserve account funding registrations and purchases
    #[serde(rename = "treasure")]
    Treasure,
    /// Immutable log entry against a wallet
    #[serde(rename = "walletTransaction")]
    WalletTransaction,
    /// Immutable log entry against the treasure
    #[serde(rename = "treasureTransaction")]
    TreasureTransaction,
    /// Per-customer configuration record
    #[serde(rename = "options")]
    Options,
}

impl DocType {
    /// Stored tag for this document type
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Wallet => "wallet",
            DocType::Treasure => "treasure",
            DocType::WalletTransaction => "walletTransaction",
            DocType::TreasureTransaction => "treasureTransaction",
            DocType::Options => "options",
        }
    }

    /// Parse from a stored tag
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wallet" => Some(DocType::Wallet),
            "treasure" => Some(DocType::Treasure),
            "walletTransaction" => Some(DocType::WalletTransaction),
            "treasureTransaction" => Some(DocType::TreasureTransaction),
            "options" => Some(DocType::Options),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named account document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Document type tag ("wallet")
    #[serde(rename = "docType")]
    pub doc_type: DocType,

    /// Caller-supplied wallet ID, unique
    pub id: String,

    /// Current balance, never negative
    pub amount: Decimal,

    /// Opaque credential fingerprint
    #[serde(rename = "mobileHash")]
    pub mobile_hash: String,
}

/// Reserve account document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treasure {
    /// Document type tag ("treasure")
    #[serde(rename = "docType")]
    pub doc_type: DocType,

    /// Current reserve balance, never negative
    pub balance: Decimal,
}

/// Immutable record of one balance-affecting action against a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    /// Document type tag ("walletTransaction")
    pub doc_type: DocType,

    /// Wallet this entry belongs to
    pub wallet_id: String,

    /// Originating logical transaction ID
    pub tx_id: String,

    /// Economic type tag ("registration", "purchase", "spend", ...)
    #[serde(rename = "type")]
    pub tx_type: String,

    /// Caller-supplied action label
    pub action: String,

    /// Caller-supplied action entity; (wallet, action, entity) is unique
    pub action_entity_id: String,

    /// Signed amount applied to the balance
    pub amount: Decimal,

    /// Creation timestamp, Unix seconds
    pub creation_date: i64,

    /// Customer namespace
    pub customer: String,
}

/// Immutable record of one balance-affecting action against the treasure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasureTransaction {
    /// Document type tag ("treasureTransaction")
    pub doc_type: DocType,

    /// Originating logical transaction ID
    pub tx_id: String,

    /// Economic type tag
    #[serde(rename = "type")]
    pub tx_type: String,

    /// Caller-supplied action label
    pub action: String,

    /// Caller-supplied action entity; (treasure, action, entity) is unique
    pub action_entity_id: String,

    /// Signed amount applied to the balance
    pub amount: Decimal,

    /// Creation timestamp, Unix seconds
    pub creation_date: i64,

    /// Customer namespace
    pub customer: String,
}

/// Per-customer configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Document type tag ("options")
    #[serde(rename = "docType")]
    pub doc_type: DocType,

    /// Default amount credited to a newly registered wallet
    pub registration: Decimal,

    /// Customer namespace this record applies to
    pub customer: String,
}

/// Per-invocation context, resolved once at call entry
#[derive(Debug, Clone)]
pub struct OpContext {
    /// Logical transaction ID stamped on every log entry of this invocation
    pub txn_id: String,

    /// Resolved customer namespace
    pub customer: String,

    /// Resolved treasure ID
    pub treasure_id: String,
}

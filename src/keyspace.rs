//! Composite key encoding for the document store
//!
//! A store key is a document type followed by ordered string attributes,
//! each segment terminated by a reserved `0x00` byte. The type is always the
//! first segment, so keys of different types never collide, and a partial
//! key is a strict byte prefix of every key it covers: prefix scans return
//! exactly the intended sub-collection.

use crate::error::{Error, Result};
use crate::types::DocType;

/// Segment terminator; never appears inside an attribute.
const SEPARATOR: u8 = 0x00;

/// Structured store key: a typed document kind plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    doc_type: DocType,
    attributes: Vec<String>,
}

impl CompositeKey {
    /// Create a key, rejecting attributes that contain the separator byte.
    pub fn new(doc_type: DocType, attributes: &[&str]) -> Result<Self> {
        for attr in attributes {
            if attr.bytes().any(|b| b == SEPARATOR) {
                return Err(Error::Validation(format!(
                    "key attribute {:?} contains a reserved separator byte",
                    attr
                )));
            }
        }

        Ok(Self {
            doc_type,
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Document type of this key
    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    /// Ordered attribute segments
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Encode to store bytes
    pub fn encode(&self) -> Vec<u8> {
        let len = self.doc_type.as_str().len()
            + self.attributes.iter().map(|a| a.len() + 1).sum::<usize>()
            + 1;
        let mut out = Vec::with_capacity(len);

        out.extend_from_slice(self.doc_type.as_str().as_bytes());
        out.push(SEPARATOR);
        for attr in &self.attributes {
            out.extend_from_slice(attr.as_bytes());
            out.push(SEPARATOR);
        }

        out
    }

    /// Byte prefix covering every key of the given document type
    pub fn type_prefix(doc_type: DocType) -> Vec<u8> {
        let mut out = doc_type.as_str().as_bytes().to_vec();
        out.push(SEPARATOR);
        out
    }

    /// Decode a stored key back into its typed segments
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        // Every segment, including the last, is separator-terminated.
        let content = bytes
            .strip_suffix(&[SEPARATOR])
            .ok_or_else(|| Error::Validation("malformed store key".to_string()))?;
        let mut segments = content.split(|b| *b == SEPARATOR);

        let type_segment = segments
            .next()
            .ok_or_else(|| Error::Validation("empty store key".to_string()))?;
        let type_str = std::str::from_utf8(type_segment)
            .map_err(|_| Error::Validation("store key is not valid UTF-8".to_string()))?;
        let doc_type = DocType::parse(type_str).ok_or_else(|| {
            Error::Validation(format!("unknown document type in store key: {:?}", type_str))
        })?;

        let mut attributes = Vec::new();
        for segment in segments {
            let attr = std::str::from_utf8(segment)
                .map_err(|_| Error::Validation("store key is not valid UTF-8".to_string()))?;
            attributes.push(attr.to_string());
        }

        Ok(Self {
            doc_type,
            attributes,
        })
    }
}

/// The account a balance mutation or log entry is applied against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    /// A named wallet
    Wallet(&'a str),
    /// A treasure reserve account
    Treasure(&'a str),
}

impl Subject<'_> {
    /// Key of the account document itself
    pub fn account_key(&self) -> Result<CompositeKey> {
        match self {
            Subject::Wallet(id) => CompositeKey::new(DocType::Wallet, &[id]),
            Subject::Treasure(id) => CompositeKey::new(DocType::Treasure, &[id]),
        }
    }

    /// Key of the log record for one (subject, action, action-entity) triple
    pub fn transaction_key(&self, action: &str, action_entity_id: &str) -> Result<CompositeKey> {
        match self {
            Subject::Wallet(id) => CompositeKey::new(
                DocType::WalletTransaction,
                &[id, action, action_entity_id],
            ),
            Subject::Treasure(id) => CompositeKey::new(
                DocType::TreasureTransaction,
                &[id, action, action_entity_id],
            ),
        }
    }

    /// Human-readable subject description for error messages
    pub fn describe(&self) -> String {
        match self {
            Subject::Wallet(id) => format!("wallet {}", id),
            Subject::Treasure(id) => format!("treasure {}", id),
        }
    }
}

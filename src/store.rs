//! Document store layer using RocksDB
//!
//! Stores JSON documents in a single `docs` column family keyed by composite
//! keys, so a prefix scan over a document type visits exactly that
//! collection. Predicate search is equality matching over document fields,
//! with skip/limit pagination applied after filtering.

use crate::{
    error::{Error, Result},
    keyspace::CompositeKey,
    types::DocType,
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, DB};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Column family names
const CF_DOCS: &str = "docs";

/// Storage wrapper for RocksDB
pub struct Store {
    db: DB,
}

impl Store {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(CF_DOCS, Self::cf_options_docs())];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db })
    }

    fn cf_options_docs() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        // Point lookups dominate (existence checks), bloom filters pay off
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_DOCS)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_DOCS)))
    }

    /// Get raw document bytes, absent as `None`
    pub fn get_raw(&self, key: &CompositeKey) -> Result<Option<Vec<u8>>> {
        let cf = self.cf()?;
        Ok(self.db.get_cf(cf, key.encode())?)
    }

    /// Get a typed document, absent as `None`
    pub fn get_json<T: DeserializeOwned>(&self, key: &CompositeKey) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Put a typed document
    pub fn put_json<T: Serialize>(&self, key: &CompositeKey, value: &T) -> Result<()> {
        let cf = self.cf()?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key.encode(), &bytes)?;

        tracing::debug!(doc_type = %key.doc_type(), "Document written");

        Ok(())
    }

    /// Check whether a document exists at the key
    pub fn exists(&self, key: &CompositeKey) -> Result<bool> {
        let cf = self.cf()?;
        Ok(self.db.get_pinned_cf(cf, key.encode())?.is_some())
    }

    /// Equality-predicate search over one document type.
    ///
    /// Visits the type's key prefix in key order, keeps documents whose
    /// fields equal every entry of `filter`, skips `skip` matches, and
    /// returns at most `limit`.
    pub fn query_by_doc_type(
        &self,
        doc_type: DocType,
        filter: Option<&serde_json::Map<String, Value>>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let cf = self.cf()?;
        let prefix = CompositeKey::type_prefix(doc_type);

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut matches = Vec::new();
        let mut skipped = 0usize;

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }

            let doc: Value = serde_json::from_slice(&value)?;
            if !matches_filter(&doc, filter) {
                continue;
            }

            if skipped < skip {
                skipped += 1;
                continue;
            }

            matches.push(doc);
            if matches.len() >= limit {
                break;
            }
        }

        Ok(matches)
    }
}

fn matches_filter(doc: &Value, filter: Option<&serde_json::Map<String, Value>>) -> bool {
    match filter {
        Some(fields) => fields.iter().all(|(k, v)| doc.get(k) == Some(v)),
        None => true,
    }
}

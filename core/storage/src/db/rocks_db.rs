// stakeledger/core/storage/src/db/rocks_db.rs

use super::column_families::ALL_CFS;
use crate::error::StorageError;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};
use std::path::Path;
use tracing::info;

/// Thin wrapper over RocksDB with the column families this crate uses
pub struct RocksDB {
    db: DB,
}

impl RocksDB {
    /// Open (or create) a database at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        info!("Opened wallet database at {:?}", path);
        Ok(Self { db })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or(StorageError::MissingColumnFamily(name))
    }

    pub fn put_cf(&self, cf: &'static str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.db.put_cf(self.cf(cf)?, key, value)?;
        Ok(())
    }

    pub fn get_cf(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get_cf(self.cf(cf)?, key)?)
    }

    pub fn exists_cf(&self, cf: &'static str, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get_cf(cf, key)?.is_some())
    }

    /// Collect every value in a column family
    pub fn values_cf(&self, cf: &'static str) -> Result<Vec<Box<[u8]>>, StorageError> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_, value) = item?;
            values.push(value);
        }
        Ok(values)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

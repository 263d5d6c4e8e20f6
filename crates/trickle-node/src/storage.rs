//! RocksDB-backed persistent incentive state.
//!
//! Implements [`IncentiveStore`] with one column family per map. Keys start
//! with the claim type byte so each claim type can be scanned on its own:
//!
//! | column family    | key                          | value                   |
//! |------------------|------------------------------|-------------------------|
//! | `accrual_times`  | type byte ‖ source id        | u64, big-endian         |
//! | `reward_indexes` | type byte ‖ source id        | bincode `RewardIndexes` |
//! | `claims`         | type byte ‖ 20-byte owner    | bincode `Claim`         |
//!
//! [`IncentiveStore::apply`] writes a whole transition in one [`WriteBatch`].

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};

use trickle_core::claim::{Claim, ClaimType};
use trickle_core::error::{IncentiveError, StoreError};
use trickle_core::index::RewardIndexes;
use trickle_core::store::{ensure_non_empty, ChangeSet, IncentiveStore};
use trickle_core::types::{Address, Timestamp};

// --- Column family names ---

const CF_ACCRUAL_TIMES: &str = "accrual_times";
const CF_REWARD_INDEXES: &str = "reward_indexes";
const CF_CLAIMS: &str = "claims";

const ALL_CFS: &[&str] = &[CF_ACCRUAL_TIMES, CF_REWARD_INDEXES, CF_CLAIMS];

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Persistent [`IncentiveStore`].
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create the database at `path`, creating missing column families.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IncentiveError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors).map_err(backend)?;
        Ok(Self { db })
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), IncentiveError> {
        Ok(self.db.flush().map_err(backend)?)
    }

    // --- Internal helpers ---

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::MissingColumnFamily(name.to_string()))
    }

    fn source_key(claim_type: ClaimType, source_id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + source_id.len());
        key.push(claim_type.as_byte());
        key.extend_from_slice(source_id.as_bytes());
        key
    }

    fn claim_key(claim_type: ClaimType, owner: &Address) -> [u8; 21] {
        let mut key = [0u8; 21];
        key[0] = claim_type.as_byte();
        key[1..].copy_from_slice(owner.as_bytes());
        key
    }

    fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, StoreError> {
        bincode::encode_to_vec(value, bincode::config::standard()).map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, StoreError> {
        let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(value)
    }

    fn decode_time(bytes: &[u8]) -> Result<Timestamp, StoreError> {
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| StoreError::Codec(format!("invalid accrual time length {}", bytes.len())))?;
        Ok(u64::from_be_bytes(raw))
    }

    /// All `(key without prefix, value)` pairs of one claim type in `cf`.
    fn scan(&self, cf: &str, claim_type: ClaimType) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let cf = self.cf_handle(cf)?;
        let prefix = [claim_type.as_byte()];
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward)) {
            let (key, value) = item.map_err(backend)?;
            if key.first() != Some(&prefix[0]) {
                break;
            }
            out.push((key[1..].to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}

impl IncentiveStore for RocksStore {
    fn accrual_time(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<Timestamp>, IncentiveError> {
        let cf = self.cf_handle(CF_ACCRUAL_TIMES)?;
        match self.db.get_cf(cf, Self::source_key(claim_type, source_id)).map_err(backend)? {
            Some(bytes) => Ok(Some(Self::decode_time(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_accrual_time(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        time: Timestamp,
    ) -> Result<(), IncentiveError> {
        let cf = self.cf_handle(CF_ACCRUAL_TIMES)?;
        self.db
            .put_cf(cf, Self::source_key(claim_type, source_id), time.to_be_bytes())
            .map_err(backend)?;
        Ok(())
    }

    fn reward_indexes(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<RewardIndexes>, IncentiveError> {
        let cf = self.cf_handle(CF_REWARD_INDEXES)?;
        match self.db.get_cf(cf, Self::source_key(claim_type, source_id)).map_err(backend)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_reward_indexes(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        indexes: RewardIndexes,
    ) -> Result<(), IncentiveError> {
        ensure_non_empty(claim_type, source_id, &indexes)?;
        let cf = self.cf_handle(CF_REWARD_INDEXES)?;
        self.db
            .put_cf(cf, Self::source_key(claim_type, source_id), Self::encode(&indexes)?)
            .map_err(backend)?;
        Ok(())
    }

    fn iter_reward_indexes(&self, claim_type: ClaimType) -> Result<Vec<(String, RewardIndexes)>, IncentiveError> {
        let mut out = Vec::new();
        for (key, value) in self.scan(CF_REWARD_INDEXES, claim_type)? {
            let source_id =
                String::from_utf8(key).map_err(|e| StoreError::Codec(format!("source id: {e}")))?;
            out.push((source_id, Self::decode(&value)?));
        }
        Ok(out)
    }

    fn claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, IncentiveError> {
        let cf = self.cf_handle(CF_CLAIMS)?;
        match self.db.get_cf(cf, Self::claim_key(claim_type, owner)).map_err(backend)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_claim(&mut self, claim: Claim) -> Result<(), IncentiveError> {
        let cf = self.cf_handle(CF_CLAIMS)?;
        self.db
            .put_cf(cf, Self::claim_key(claim.claim_type, &claim.owner), Self::encode(&claim)?)
            .map_err(backend)?;
        Ok(())
    }

    fn iter_claims(&self, claim_type: ClaimType) -> Result<Vec<Claim>, IncentiveError> {
        self.scan(CF_CLAIMS, claim_type)?
            .into_iter()
            .map(|(_, value)| Ok(Self::decode(&value)?))
            .collect()
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<(), IncentiveError> {
        let cf_times = self.cf_handle(CF_ACCRUAL_TIMES)?;
        let cf_indexes = self.cf_handle(CF_REWARD_INDEXES)?;
        let cf_claims = self.cf_handle(CF_CLAIMS)?;

        let mut batch = WriteBatch::default();
        for ((claim_type, source_id), time) in &changes.accrual_times {
            batch.put_cf(cf_times, Self::source_key(*claim_type, source_id), time.to_be_bytes());
        }
        for ((claim_type, source_id), indexes) in &changes.reward_indexes {
            ensure_non_empty(*claim_type, source_id, indexes)?;
            batch.put_cf(cf_indexes, Self::source_key(*claim_type, source_id), Self::encode(indexes)?);
        }
        for ((claim_type, owner), claim) in &changes.claims {
            batch.put_cf(cf_claims, Self::claim_key(*claim_type, owner), Self::encode(claim)?);
        }

        self.db.write(batch).map_err(backend)?;
        Ok(())
    }
}

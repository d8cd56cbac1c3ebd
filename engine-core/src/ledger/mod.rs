//! Tenant-partitioned transactional document store abstraction.
//!
//! The engines own no persistent state; every state transition is one
//! optimistic read-modify-write against this interface. A commit carries the
//! versions observed at read time and fails atomically with `Conflict` when
//! any of them moved, which is what serializes concurrent decisions on the
//! same record.

use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

pub mod memory;

pub type Version = u64;

/// Address of a document inside a tenant partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub collection: &'static str,
    pub id: Uuid,
}

impl LedgerKey {
    pub fn new(collection: &'static str, id: Uuid) -> Self {
        Self { collection, id }
    }
}

/// A document together with the version observed at read time.
#[derive(Debug, Clone)]
pub struct VersionedDocument {
    pub key: LedgerKey,
    pub version: Version,
    pub body: Value,
}

impl VersionedDocument {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(self.body.clone()).map_err(AppError::from)
    }
}

#[derive(Debug, Clone)]
pub enum WriteOp {
    Put(Value),
    Delete,
}

/// A single write inside an atomic batch.
#[derive(Debug, Clone)]
pub struct LedgerWrite {
    pub key: LedgerKey,
    /// Version observed when the document was read; `None` asserts the
    /// document does not exist yet (insert).
    pub expected: Option<Version>,
    pub op: WriteOp,
}

impl LedgerWrite {
    pub fn insert<T: Serialize>(key: LedgerKey, value: &T) -> Result<Self, AppError> {
        Ok(Self {
            key,
            expected: None,
            op: WriteOp::Put(serde_json::to_value(value)?),
        })
    }

    pub fn update<T: Serialize>(
        key: LedgerKey,
        expected: Version,
        value: &T,
    ) -> Result<Self, AppError> {
        Ok(Self {
            key,
            expected: Some(expected),
            op: WriteOp::Put(serde_json::to_value(value)?),
        })
    }

    pub fn delete(key: LedgerKey, expected: Version) -> Self {
        Self {
            key,
            expected: Some(expected),
            op: WriteOp::Delete,
        }
    }
}

/// Transactional document store, partitioned by tenant.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get(
        &self,
        tenant_id: Uuid,
        key: &LedgerKey,
    ) -> Result<Option<VersionedDocument>, AppError>;

    /// All documents of a collection, in stable stored (insertion) order.
    async fn list(
        &self,
        tenant_id: Uuid,
        collection: &'static str,
    ) -> Result<Vec<VersionedDocument>, AppError>;

    /// Apply every write or none. Any version mismatch, or an insert hitting
    /// an existing document, fails the whole batch with `Conflict`.
    async fn commit(&self, tenant_id: Uuid, writes: Vec<LedgerWrite>) -> Result<(), AppError>;
}

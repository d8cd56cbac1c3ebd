//! In-memory `LedgerStore` for tests and embedded callers.

use super::{LedgerKey, LedgerStore, LedgerWrite, Version, VersionedDocument, WriteOp};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Stored {
    version: Version,
    /// Global insertion sequence; `list` returns documents in this order.
    seq: u64,
    body: Value,
}

type Partition = HashMap<(&'static str, Uuid), Stored>;

#[derive(Debug, Default)]
struct State {
    next_seq: u64,
    partitions: HashMap<Uuid, Partition>,
}

/// Single-process ledger with atomic multi-document commits.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: RwLock<State>,
}

impl MemoryLedger {
    fn poisoned() -> AppError {
        AppError::StorageError(anyhow::anyhow!("ledger lock poisoned"))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get(
        &self,
        tenant_id: Uuid,
        key: &LedgerKey,
    ) -> Result<Option<VersionedDocument>, AppError> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .partitions
            .get(&tenant_id)
            .and_then(|p| p.get(&(key.collection, key.id)))
            .map(|stored| VersionedDocument {
                key: *key,
                version: stored.version,
                body: stored.body.clone(),
            }))
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        collection: &'static str,
    ) -> Result<Vec<VersionedDocument>, AppError> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut docs: Vec<(u64, VersionedDocument)> = state
            .partitions
            .get(&tenant_id)
            .map(|p| {
                p.iter()
                    .filter(|((c, _), _)| *c == collection)
                    .map(|((_, id), stored)| {
                        (
                            stored.seq,
                            VersionedDocument {
                                key: LedgerKey::new(collection, *id),
                                version: stored.version,
                                body: stored.body.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by_key(|(seq, _)| *seq);
        Ok(docs.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn commit(&self, tenant_id: Uuid, writes: Vec<LedgerWrite>) -> Result<(), AppError> {
        let mut guard = self.inner.write().map_err(|_| Self::poisoned())?;
        let state = &mut *guard;

        // Validate every precondition before touching anything.
        for write in &writes {
            let current = state
                .partitions
                .get(&tenant_id)
                .and_then(|p| p.get(&(write.key.collection, write.key.id)))
                .map(|stored| stored.version);
            if current != write.expected {
                return Err(AppError::Conflict(format!(
                    "{}/{}: expected version {:?}, found {:?}",
                    write.key.collection, write.key.id, write.expected, current
                )));
            }
        }

        let partition = state.partitions.entry(tenant_id).or_default();
        for write in writes {
            let slot = (write.key.collection, write.key.id);
            match write.op {
                WriteOp::Put(body) => match partition.get_mut(&slot) {
                    Some(stored) => {
                        stored.version += 1;
                        stored.body = body;
                    }
                    None => {
                        partition.insert(
                            slot,
                            Stored {
                                version: 1,
                                seq: state.next_seq,
                                body,
                            },
                        );
                        state.next_seq += 1;
                    }
                },
                WriteOp::Delete => {
                    partition.remove(&slot);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WIDGETS: &str = "widgets";

    #[tokio::test]
    async fn insert_then_get_roundtrips() {
        let ledger = MemoryLedger::default();
        let tenant = Uuid::new_v4();
        let key = LedgerKey::new(WIDGETS, Uuid::new_v4());

        ledger
            .commit(
                tenant,
                vec![LedgerWrite::insert(key, &json!({"n": 1})).unwrap()],
            )
            .await
            .unwrap();

        let doc = ledger.get(tenant, &key).await.unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.body, json!({"n": 1}));
    }

    #[tokio::test]
    async fn stale_version_fails_whole_batch() {
        let ledger = MemoryLedger::default();
        let tenant = Uuid::new_v4();
        let a = LedgerKey::new(WIDGETS, Uuid::new_v4());
        let b = LedgerKey::new(WIDGETS, Uuid::new_v4());

        ledger
            .commit(
                tenant,
                vec![
                    LedgerWrite::insert(a, &json!({"n": 1})).unwrap(),
                    LedgerWrite::insert(b, &json!({"n": 2})).unwrap(),
                ],
            )
            .await
            .unwrap();

        // Batch with one good write and one stale write must apply nothing.
        let result = ledger
            .commit(
                tenant,
                vec![
                    LedgerWrite::update(a, 1, &json!({"n": 10})).unwrap(),
                    LedgerWrite::update(b, 99, &json!({"n": 20})).unwrap(),
                ],
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let doc = ledger.get(tenant, &a).await.unwrap().unwrap();
        assert_eq!(doc.body, json!({"n": 1}));
    }

    #[tokio::test]
    async fn insert_over_existing_conflicts() {
        let ledger = MemoryLedger::default();
        let tenant = Uuid::new_v4();
        let key = LedgerKey::new(WIDGETS, Uuid::new_v4());

        ledger
            .commit(tenant, vec![LedgerWrite::insert(key, &json!(1)).unwrap()])
            .await
            .unwrap();
        let result = ledger
            .commit(tenant, vec![LedgerWrite::insert(key, &json!(2)).unwrap()])
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let ledger = MemoryLedger::default();
        let tenant = Uuid::new_v4();

        for n in 0..5 {
            let key = LedgerKey::new(WIDGETS, Uuid::new_v4());
            ledger
                .commit(
                    tenant,
                    vec![LedgerWrite::insert(key, &json!({"n": n})).unwrap()],
                )
                .await
                .unwrap();
        }

        let docs = ledger.list(tenant, WIDGETS).await.unwrap();
        let order: Vec<i64> = docs
            .iter()
            .map(|d| d.body["n"].as_i64().unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn partitions_are_tenant_isolated() {
        let ledger = MemoryLedger::default();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let key = LedgerKey::new(WIDGETS, Uuid::new_v4());

        ledger
            .commit(tenant_a, vec![LedgerWrite::insert(key, &json!(1)).unwrap()])
            .await
            .unwrap();

        assert!(ledger.get(tenant_b, &key).await.unwrap().is_none());
        assert!(ledger.list(tenant_b, WIDGETS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_observed_version() {
        let ledger = MemoryLedger::default();
        let tenant = Uuid::new_v4();
        let key = LedgerKey::new(WIDGETS, Uuid::new_v4());

        ledger
            .commit(tenant, vec![LedgerWrite::insert(key, &json!(1)).unwrap()])
            .await
            .unwrap();
        ledger
            .commit(
                tenant,
                vec![LedgerWrite::update(key, 1, &json!(2)).unwrap()],
            )
            .await
            .unwrap();

        let stale = ledger.commit(tenant, vec![LedgerWrite::delete(key, 1)]).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));

        ledger
            .commit(tenant, vec![LedgerWrite::delete(key, 2)])
            .await
            .unwrap();
        assert!(ledger.get(tenant, &key).await.unwrap().is_none());
    }
}

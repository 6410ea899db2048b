use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::{Address, AddressDraft};
use crate::services::repository::{AddressRepository, RepositoryError};

struct Table {
    rows: BTreeMap<i64, Address>,
    next_id: i64,
}

/// Process-local address store
///
/// Used when no database is configured, and by the tests. Ids start at 1
/// and are never reused.
pub struct InMemoryAddressRepository {
    table: RwLock<Table>,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryAddressRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn list_all(&self) -> Result<Vec<Address>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Address, RepositoryError> {
        let table = self.table.read().await;
        table.rows.get(&id).cloned().ok_or(RepositoryError::NotFound(id))
    }

    async fn create(&self, draft: AddressDraft) -> Result<Address, RepositoryError> {
        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;

        let address = Address::from_draft(id, draft, chrono::Utc::now());
        table.rows.insert(id, address.clone());

        Ok(address)
    }

    async fn update(&self, id: i64, draft: AddressDraft) -> Result<Address, RepositoryError> {
        let mut table = self.table.write().await;
        let address = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        address.replace_with(draft, chrono::Utc::now());
        Ok(address.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        table.rows.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound(id))
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Ok(true)
    }
}

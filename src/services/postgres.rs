use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::models::{Address, AddressDraft, Coordinate};
use crate::services::repository::{AddressRepository, RepositoryError};

const ADDRESS_COLUMNS: &str = "id, name, address_line, city, state, country, postal_code, map_url, latitude, longitude, created_at, updated_at";

/// PostgreSQL-backed address store
pub struct PostgresAddressRepository {
    pool: PgPool,
}

impl PostgresAddressRepository {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(url: &str, settings: &DatabaseSettings) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL (max {} connections)", settings.max_connections);

        Self::new(
            url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
            Duration::from_secs(settings.idle_timeout_secs),
        )
        .await
    }
}

fn address_from_row(row: &PgRow) -> Result<Address, RepositoryError> {
    let id: i64 = row.try_get("id")?;
    let coordinate = Coordinate::new(row.try_get("latitude")?, row.try_get("longitude")?)
        .map_err(|e| RepositoryError::Storage(format!("address {} has an invalid coordinate: {}", id, e)))?;

    Ok(Address {
        id,
        name: row.try_get("name")?,
        address_line: row.try_get("address_line")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        postal_code: row.try_get("postal_code")?,
        map_url: row.try_get("map_url")?,
        coordinate,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl AddressRepository for PostgresAddressRepository {
    async fn list_all(&self) -> Result<Vec<Address>, RepositoryError> {
        let query = format!("SELECT {} FROM addresses ORDER BY id", ADDRESS_COLUMNS);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(address_from_row).collect()
    }

    async fn get(&self, id: i64) -> Result<Address, RepositoryError> {
        let query = format!("SELECT {} FROM addresses WHERE id = $1", ADDRESS_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        address_from_row(&row)
    }

    async fn create(&self, draft: AddressDraft) -> Result<Address, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO addresses (name, address_line, city, state, country, postal_code, map_url, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&draft.name)
            .bind(&draft.address_line)
            .bind(&draft.city)
            .bind(&draft.state)
            .bind(&draft.country)
            .bind(&draft.postal_code)
            .bind(&draft.map_url)
            .bind(draft.coordinate.latitude)
            .bind(draft.coordinate.longitude)
            .fetch_one(&self.pool)
            .await?;

        let address = address_from_row(&row)?;
        tracing::debug!("Inserted address {}", address.id);

        Ok(address)
    }

    async fn update(&self, id: i64, draft: AddressDraft) -> Result<Address, RepositoryError> {
        let query = format!(
            r#"
            UPDATE addresses SET
                name = $1,
                address_line = $2,
                city = $3,
                state = $4,
                country = $5,
                postal_code = $6,
                map_url = $7,
                latitude = $8,
                longitude = $9,
                updated_at = NOW()
            WHERE id = $10
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&draft.name)
            .bind(&draft.address_line)
            .bind(&draft.city)
            .bind(&draft.state)
            .bind(&draft.country)
            .bind(&draft.postal_code)
            .bind(&draft.map_url)
            .bind(draft.coordinate.latitude)
            .bind(draft.coordinate.longitude)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        address_from_row(&row)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }

        tracing::debug!("Deleted address {}", id);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

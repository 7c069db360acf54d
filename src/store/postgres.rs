use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use super::{ListingStore, ListingUpdate, StoreError};

const UPDATE_LISTING_SQL: &str = r#"
    UPDATE listings
    SET content = $1,
        photos = $2,
        updated_at = NOW()
    WHERE ref = $3
"#;

const LATEST_SCRAPE_INFO_SQL: &str = r#"
    SELECT id::BIGINT
    FROM scrapped_infos
    ORDER BY created_at DESC
    LIMIT 1
"#;

const RECORD_FAILED_LINKS_SQL: &str = r#"
    UPDATE scrapped_infos
    SET links_failed = $1,
        updated_at = NOW()
    WHERE id = $2
"#;

/// `ListingStore` over a Postgres pool
#[derive(Debug, Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        info!("Connecting to database (max {} connections)", max_connections);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Database connected");
        Ok(Self::new(pool))
    }
}

/// An empty list is stored as a single empty entry
fn failed_links_column(links: &[String]) -> Vec<String> {
    if links.is_empty() {
        vec![String::new()]
    } else {
        links.to_vec()
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn update_listing(&self, reference: &str, update: &ListingUpdate) -> Result<(), StoreError> {
        let photos = serde_json::to_value(&update.photos)?;

        let result = sqlx::query(UPDATE_LISTING_SQL)
            .bind(&update.content)
            .bind(photos)
            .bind(reference)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                reference: reference.to_string(),
            });
        }
        debug!("Updated listing {}", reference);
        Ok(())
    }

    async fn record_failed_links(&self, links: &[String]) -> Result<(), StoreError> {
        let id: i64 = sqlx::query_scalar(LATEST_SCRAPE_INFO_SQL)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NoScrapeInfo)?;

        let result = sqlx::query(RECORD_FAILED_LINKS_SQL)
            .bind(failed_links_column(links))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NoScrapeInfo);
        }
        info!("Recorded {} failed links on scrape info {}", links.len(), id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_failure_list_becomes_placeholder() {
        assert_eq!(failed_links_column(&[]), vec![String::new()]);
        let links = vec!["https://a".to_string()];
        assert_eq!(failed_links_column(&links), links);
    }
}

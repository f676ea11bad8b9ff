pub mod mongodb;
pub mod repositories;

pub use self::mongodb::{
    create_mongo_client, get_database, health_check as mongo_health_check, MongoClient,
    MongoDatabase,
};
pub use repositories::*;

use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub mongodb_url: String,
    pub database_name: String,
    pub connection_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mongodb_url: "mongodb://localhost:27017".to_string(),
            database_name: "tradeflow".to_string(),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

pub async fn initialize_database(config: &DatabaseConfig) -> Result<(MongoClient, MongoDatabase)> {
    let client = create_mongo_client(&config.mongodb_url, config.connection_timeout).await?;
    let database = get_database(&client, &config.database_name);

    // Indexes back the single-latest-version invariant
    BomRepository::new(&database).ensure_indexes().await?;

    Ok((client, database))
}

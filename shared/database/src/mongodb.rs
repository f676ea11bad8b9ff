use anyhow::{Context, Result};
use mongodb::{options::ClientOptions, Client, Database};
use std::time::Duration;

pub type MongoClient = Client;
pub type MongoDatabase = Database;

pub async fn create_mongo_client(database_url: &str, timeout: Duration) -> Result<MongoClient> {
    let mut options = ClientOptions::parse(database_url)
        .await
        .context("Invalid MongoDB connection string")?;
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    options.app_name = Some("tradeflow".to_string());

    let client = Client::with_options(options)?;

    // Test connection
    health_check(&client)
        .await
        .context("MongoDB did not answer ping")?;

    tracing::info!("Connected to MongoDB database");
    Ok(client)
}

pub fn get_database(client: &MongoClient, database_name: &str) -> MongoDatabase {
    client.database(database_name)
}

pub async fn health_check(client: &MongoClient) -> Result<()> {
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await?;
    Ok(())
}

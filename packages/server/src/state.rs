use std::sync::Arc;

use common::storage::FileStorage;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub storage: Arc<dyn FileStorage>,
}

pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;

use crate::commands::AppState;
use crate::db::DbPool;
use crate::error::AppResult;

const DATABASE_FILE: &str = "crm.sqlite";
const LOG_DIR: &str = "logs";

/// Sets up logging and the local store under `data_dir` and returns the
/// state every command runs against.
pub fn bootstrap(data_dir: &Path) -> AppResult<AppState> {
    std::fs::create_dir_all(data_dir)?;
    crate::utils::logger::init_logging(&data_dir.join(LOG_DIR))?;

    let pool = DbPool::new(data_dir.join(DATABASE_FILE))?;
    AppState::new(pool)
}

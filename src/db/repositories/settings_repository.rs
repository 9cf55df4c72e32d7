use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct AppSettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for AppSettingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<AppSettingRow>> {
        let mut stmt =
            conn.prepare("SELECT key, value, updated_at FROM app_settings WHERE key = ?1")?;

        let row = stmt
            .query_row([key], |row| AppSettingRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn get_value(conn: &Connection, key: &str) -> AppResult<Option<String>> {
        Ok(Self::get(conn, key)?.map(|row| row.value))
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_settings (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }

    /// Writes every pair or none of them.
    pub fn upsert_many(conn: &Connection, entries: &[(&str, String)]) -> AppResult<()> {
        let tx = conn.unchecked_transaction()?;
        for (key, value) in entries {
            Self::upsert(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_keys(conn: &Connection, keys: &[&str]) -> AppResult<usize> {
        let mut removed = 0;
        for key in keys {
            removed += conn.execute("DELETE FROM app_settings WHERE key = ?1", [key])?;
        }
        Ok(removed)
    }
}

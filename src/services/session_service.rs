use reqwest::Url;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::role::Role;
use crate::models::session::{Session, SessionIdentity};
use crate::services::api_client::{ApiClient, KEY_API_BASE_URL};
use crate::utils::crypto::CryptoVault;
use crate::utils::redact::mask_token;

const KEY_SESSION_TOKEN: &str = "session_token";
const KEY_SESSION_ROLE: &str = "session_role";
const KEY_SESSION_USERNAME: &str = "session_username";
const KEY_SESSION_USER_ID: &str = "session_user_id";

const SESSION_KEYS: [&str; 4] = [
    KEY_SESSION_TOKEN,
    KEY_SESSION_ROLE,
    KEY_SESSION_USERNAME,
    KEY_SESSION_USER_ID,
];

/// Keeps the signed-in session in the local store and hands its token to the
/// API client. The token is stored encrypted.
pub struct SessionService {
    db: DbPool,
    vault: CryptoVault,
    api: ApiClient,
}

impl SessionService {
    pub fn new(db: DbPool, api: ApiClient) -> Self {
        let vault = CryptoVault::from_database_path(db.path());
        Self { db, vault, api }
    }

    pub fn save(&self, session: Session) -> AppResult<SessionIdentity> {
        let token = session.token.trim().to_string();
        if token.is_empty() {
            return Err(AppError::validation("Session token is required"));
        }
        let username = session.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::validation("Username is required"));
        }

        let encrypted = self.vault.encrypt(token.as_bytes())?;
        let mut entries = vec![
            (KEY_SESSION_TOKEN, encrypted),
            (KEY_SESSION_ROLE, session.role.as_str().to_string()),
            (KEY_SESSION_USERNAME, username.clone()),
        ];
        if let Some(user_id) = session.user_id {
            entries.push((KEY_SESSION_USER_ID, user_id.to_string()));
        }

        self.db.with_connection(|conn| {
            SettingsRepository::delete_keys(conn, &[KEY_SESSION_USER_ID])?;
            SettingsRepository::upsert_many(conn, &entries)
        })?;

        self.api.set_token(Some(token.clone()));
        info!(
            target: "app::session",
            role = %session.role,
            %username,
            token = %mask_token(&token),
            "session saved"
        );

        Ok(SessionIdentity {
            role: session.role,
            username,
            user_id: session.user_id,
        })
    }

    /// Reads the stored session. Unreadable entries count as signed out.
    pub fn load(&self) -> AppResult<Option<Session>> {
        let (token, role, username, user_id) = self.db.with_connection(|conn| {
            Ok((
                SettingsRepository::get_value(conn, KEY_SESSION_TOKEN)?,
                SettingsRepository::get_value(conn, KEY_SESSION_ROLE)?,
                SettingsRepository::get_value(conn, KEY_SESSION_USERNAME)?,
                SettingsRepository::get_value(conn, KEY_SESSION_USER_ID)?,
            ))
        })?;

        let (Some(token), Some(role), Some(username)) = (token, role, username) else {
            return Ok(None);
        };

        let token = match self
            .vault
            .decrypt(&token)
            .and_then(|bytes| String::from_utf8(bytes).map_err(|err| AppError::other(err.to_string())))
        {
            Ok(token) => token,
            Err(err) => {
                warn!(target: "app::session", error = %err, "stored session token unreadable");
                return Ok(None);
            }
        };

        let role = match role.parse::<Role>() {
            Ok(role) => role,
            Err(err) => {
                warn!(target: "app::session", error = %err, "stored session role unreadable");
                return Ok(None);
            }
        };

        Ok(Some(Session {
            token,
            role,
            username,
            user_id: user_id.and_then(|value| value.parse().ok()),
        }))
    }

    /// Loads the stored session and points the API client at its token.
    pub fn restore(&self) -> AppResult<Option<SessionIdentity>> {
        let session = self.load()?;
        self.api.set_token(session.as_ref().map(|s| s.token.clone()));
        Ok(session.as_ref().map(SessionIdentity::from))
    }

    /// Who is signed in, read without decrypting the token.
    pub fn current(&self) -> AppResult<Option<SessionIdentity>> {
        let (has_token, role, username, user_id) = self.db.with_connection(|conn| {
            Ok((
                SettingsRepository::get(conn, KEY_SESSION_TOKEN)?.is_some(),
                SettingsRepository::get_value(conn, KEY_SESSION_ROLE)?,
                SettingsRepository::get_value(conn, KEY_SESSION_USERNAME)?,
                SettingsRepository::get_value(conn, KEY_SESSION_USER_ID)?,
            ))
        })?;

        let (true, Some(role), Some(username)) = (has_token, role, username) else {
            return Ok(None);
        };

        Ok(role.parse::<Role>().ok().map(|role| SessionIdentity {
            role,
            username,
            user_id: user_id.and_then(|value| value.parse().ok()),
        }))
    }

    pub fn clear(&self) -> AppResult<()> {
        let removed = self
            .db
            .with_connection(|conn| SettingsRepository::delete_keys(conn, &SESSION_KEYS))?;
        self.api.set_token(None);
        info!(target: "app::session", removed, "session cleared");
        Ok(())
    }

    /// Stores the backend address used from the next start on.
    pub fn store_api_base_url(&self, base_url: &str) -> AppResult<String> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|_| AppError::validation(format!("{trimmed} is not a valid URL")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::validation("API address must use http or https"));
        }

        self.db
            .with_connection(|conn| SettingsRepository::upsert(conn, KEY_API_BASE_URL, trimmed))?;
        info!(target: "app::session", base_url = %trimmed, "api base url stored");
        Ok(trimmed.to_string())
    }
}

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: u64,
}

#[derive(Debug)]
pub enum AuthError {
    UserExists,
    InvalidUsername,
    InvalidPassword,
    DbError(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::UserExists => write!(f, "user already exists"),
            AuthError::InvalidUsername => write!(f, "username is required"),
            AuthError::InvalidPassword => write!(f, "password is required"),
            AuthError::DbError(message) => write!(f, "auth db error: {}", message),
        }
    }
}

impl std::error::Error for AuthError {}

fn db_err(err: impl std::fmt::Display) -> AuthError {
    AuthError::DbError(err.to_string())
}

/// Users and bearer sessions, stored next to the catalog tables.
#[derive(Clone)]
pub struct AuthStore {
    db: Arc<Database>,
    session_ttl: Duration,
}

impl AuthStore {
    pub fn new(db: Arc<Database>, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }

    pub fn init_tables(&self) -> Result<(), AuthError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let _users = write_txn.open_table(USERS_TABLE).map_err(db_err)?;
            let _sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    pub fn user_count(&self) -> Result<u64, AuthError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(USERS_TABLE).map_err(db_err)?;
        table.len().map_err(db_err)
    }

    pub fn has_any_user(&self) -> Result<bool, AuthError> {
        Ok(self.user_count()? > 0)
    }

    /// First-run setup: only succeeds while no user exists. The emptiness
    /// check shares the insert's write transaction.
    pub fn create_first_admin(&self, username: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.insert_user(username, password, UserRole::Admin, true)
    }

    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> Result<AuthUser, AuthError> {
        self.insert_user(username, password, role, false)
    }

    fn insert_user(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
        require_empty: bool,
    ) -> Result<AuthUser, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidUsername);
        }
        if password.is_empty() {
            return Err(AuthError::InvalidPassword);
        }

        let txn = self.db.begin_write().map_err(db_err)?;
        let user = {
            let mut table = txn.open_table(USERS_TABLE).map_err(db_err)?;
            if require_empty && table.len().map_err(db_err)? > 0 {
                return Err(AuthError::UserExists);
            }
            for item in table.iter().map_err(db_err)? {
                let item = item.map_err(db_err)?;
                let existing: AuthUser = bincode::deserialize(item.1.value()).map_err(db_err)?;
                if existing.username.eq_ignore_ascii_case(username) {
                    return Err(AuthError::UserExists);
                }
            }

            let user = AuthUser {
                id: uuid::Uuid::new_v4().to_string(),
                username: username.to_string(),
                password_hash: hash_password(password),
                role,
            };
            let bytes = bincode::serialize(&user).map_err(db_err)?;
            table
                .insert(user.id.as_str(), bytes.as_slice())
                .map_err(db_err)?;
            user
        };
        txn.commit().map_err(db_err)?;
        Ok(user)
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<AuthUser>, AuthError> {
        let user = match self.get_user_by_username(username)? {
            Some(u) => u,
            None => return Ok(None),
        };
        if !verify_password(password, &user.password_hash) {
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Issues a session and drops any expired ones in the same transaction.
    pub fn create_session(&self, user_id: &str) -> Result<SessionToken, AuthError> {
        let now = now_secs();
        let session = SessionToken {
            token: generate_token(),
            user_id: user_id.to_string(),
            expires_at: now + self.session_ttl.as_secs(),
        };

        let txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            let mut expired = Vec::new();
            for item in table.iter().map_err(db_err)? {
                let (key, value) = item.map_err(db_err)?;
                let stored: SessionToken = bincode::deserialize(value.value()).map_err(db_err)?;
                if is_expired(&stored, now) {
                    expired.push(key.value().to_string());
                }
            }
            for token in &expired {
                table.remove(token.as_str()).map_err(db_err)?;
            }
            let bytes = bincode::serialize(&session).map_err(db_err)?;
            table
                .insert(session.token.as_str(), bytes.as_slice())
                .map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;
        Ok(session)
    }

    pub fn revoke_session(&self, token: &str) -> Result<(), AuthError> {
        let txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            table.remove(token).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;
        Ok(())
    }

    /// Resolves a bearer token. An expired session is removed on sight.
    pub fn user_from_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let sessions = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
        let session: SessionToken = match sessions.get(token).map_err(db_err)? {
            Some(value) => bincode::deserialize(value.value()).map_err(db_err)?,
            None => return Ok(None),
        };
        if is_expired(&session, now_secs()) {
            drop(sessions);
            drop(read_txn);
            self.revoke_session(token)?;
            return Ok(None);
        }

        let users = read_txn.open_table(USERS_TABLE).map_err(db_err)?;
        let result = match users.get(session.user_id.as_str()).map_err(db_err)? {
            Some(value) => Ok(Some(bincode::deserialize(value.value()).map_err(db_err)?)),
            None => Ok(None),
        };
        result
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(USERS_TABLE).map_err(db_err)?;
        for item in table.iter().map_err(db_err)? {
            let item = item.map_err(db_err)?;
            let user: AuthUser = bincode::deserialize(item.1.value()).map_err(db_err)?;
            if user.username.eq_ignore_ascii_case(username.trim()) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password);
    format!("{:x}", hasher.finalize())
}

fn verify_password(password: &str, hash: &str) -> bool {
    hash_password(password) == hash
}

fn generate_token() -> String {
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..32)
        .map(|_| CHARS[rng.random_range(0..CHARS.len())] as char)
        .collect()
}

fn is_expired(session: &SessionToken, now: u64) -> bool {
    session.expires_at <= now
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

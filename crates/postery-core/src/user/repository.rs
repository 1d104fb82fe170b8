//! User repository: registration, login, sessions

use super::model::{User, UserRecord};
use super::password::{hash_password, verify_password};
use crate::error::{Result, StoreError};
use crate::identity::IdentityResolver;
use crate::types::{IdSequence, SessionToken, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{debug, info};

/// Contract for user storage backends
pub trait UserStore: Send + Sync {
    /// Register a new account
    fn register(&self, username: &str, email: &str, password: &str) -> Result<User>;

    /// Check credentials and open a session
    fn login(&self, username: &str, password: &str) -> Result<SessionToken>;

    /// Close a session, returning whether it existed
    fn logout(&self, token: &SessionToken) -> Result<bool>;

    /// Load a user by ID
    fn get_user(&self, id: UserId) -> Result<User>;
}

#[derive(Debug, Default)]
struct UserTable {
    users: BTreeMap<UserId, UserRecord>,
    by_username: HashMap<String, UserId>,
    by_email: HashMap<String, UserId>,
    sessions: HashMap<SessionToken, UserId>,
    ids: IdSequence,
}

impl UserTable {
    fn check_available(&self, username: &str, email: &str) -> Result<()> {
        if self.by_username.contains_key(username) {
            return Err(StoreError::AlreadyExists(format!(
                "Username {:?} is taken",
                username
            )));
        }
        if self.by_email.contains_key(email) {
            return Err(StoreError::AlreadyExists(format!(
                "Email {:?} is already registered",
                email
            )));
        }
        Ok(())
    }

    fn insert(&mut self, record: UserRecord) {
        let id = record.user.id;
        self.by_username.insert(record.user.username.clone(), id);
        self.by_email.insert(record.user.email.clone(), id);
        self.users.insert(id, record);
    }
}

/// In-memory user repository.
///
/// Sessions are process-local and are not part of [`UserRepository::records`].
#[derive(Debug, Default)]
pub struct UserRepository {
    inner: RwLock<UserTable>,
}

impl UserRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a repository from stored records
    pub fn from_records(records: Vec<UserRecord>, next_id: u64) -> Result<Self> {
        let mut table = UserTable::default();
        let floor = records.iter().map(|r| r.user.id.get() + 1).max().unwrap_or(1);

        for record in records {
            table.check_available(&record.user.username, &record.user.email)?;
            if table.users.contains_key(&record.user.id) {
                return Err(StoreError::AlreadyExists(format!(
                    "Duplicate user ID {}",
                    record.user.id
                )));
            }
            table.insert(record);
        }
        table.ids = IdSequence::starting_at(next_id.max(floor));

        Ok(Self {
            inner: RwLock::new(table),
        })
    }

    /// Copy out all records and the next ID to assign
    pub fn records(&self) -> Result<(Vec<UserRecord>, u64)> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("user"))?;
        Ok((table.users.values().cloned().collect(), table.ids.peek()))
    }

    /// Get total user count
    pub fn count(&self) -> Result<usize> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("user"))?;
        Ok(table.users.len())
    }

    /// Number of open sessions
    pub fn session_count(&self) -> Result<usize> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("user"))?;
        Ok(table.sessions.len())
    }
}

fn require_field(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

impl UserStore for UserRepository {
    fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        require_field(username, "Username")?;
        require_field(email, "Email")?;
        require_field(password, "Password")?;

        // Fail fast before paying for the hash
        self.inner
            .read()
            .map_err(|_| StoreError::poisoned("user"))?
            .check_available(username, email)?;

        let password_hash = hash_password(password)?;

        let mut table = self.inner.write().map_err(|_| StoreError::poisoned("user"))?;
        table.check_available(username, email)?;

        let user = User {
            id: UserId(table.ids.next_value()),
            username: username.to_string(),
            email: email.to_string(),
        };
        table.insert(UserRecord {
            user: user.clone(),
            password_hash,
        });

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        let (id, password_hash) = {
            let table = self.inner.read().map_err(|_| StoreError::poisoned("user"))?;
            let id = *table.by_username.get(username).ok_or_else(|| {
                StoreError::NotFound(format!("User {:?} not found", username))
            })?;
            let record = table
                .users
                .get(&id)
                .ok_or_else(|| StoreError::Internal(format!("User index points at missing {}", id)))?;
            (id, record.password_hash.clone())
        };

        if !verify_password(password, &password_hash)? {
            debug!(user_id = %id, "Login rejected");
            return Err(StoreError::InvalidCredential(format!(
                "Incorrect password for user {:?}",
                username
            )));
        }

        let token = SessionToken::generate();
        self.inner
            .write()
            .map_err(|_| StoreError::poisoned("user"))?
            .sessions
            .insert(token.clone(), id);

        info!(user_id = %id, "User logged in");
        Ok(token)
    }

    fn logout(&self, token: &SessionToken) -> Result<bool> {
        let removed = self
            .inner
            .write()
            .map_err(|_| StoreError::poisoned("user"))?
            .sessions
            .remove(token);

        if let Some(id) = removed {
            debug!(user_id = %id, "User logged out");
        }
        Ok(removed.is_some())
    }

    fn get_user(&self, id: UserId) -> Result<User> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("user"))?;
        table
            .users
            .get(&id)
            .map(|r| r.user.clone())
            .ok_or_else(|| StoreError::NotFound(format!("User {} not found", id)))
    }
}

impl IdentityResolver for UserRepository {
    fn resolve_identity(&self, token: &str) -> Option<UserId> {
        let table = self.inner.read().ok()?;
        table.sessions.get(&SessionToken(token.to_string())).copied()
    }
}

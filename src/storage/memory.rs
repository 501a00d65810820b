use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    Account, AccountDirectory, Chirp, ChirpRepository, RefreshTokenRecord, RefreshTokenRepository,
    SortOrder, StoreError, UserRepository,
};

/// In-process store used by the test suites and for running without a
/// database. Each trait method takes one lock, so every call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, Account>>,
    chirps: Mutex<Vec<Chirp>>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, StoreError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|a| a.email == email) {
            return Err(StoreError::UniqueViolation(format!("email {} already registered", email)));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_chirpy_red: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, StoreError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|a| a.email == email && a.id != id) {
            return Err(StoreError::UniqueViolation(format!("email {} already registered", email)));
        }

        Ok(users.get_mut(&id).map(|account| {
            account.email = email.to_string();
            account.password_hash = password_hash.to_string();
            account.updated_at = Utc::now();
            account.clone()
        }))
    }

    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = lock(&self.users)?;
        let account = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.is_chirpy_red = true;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut users = lock(&self.users)?;
        let mut chirps = lock(&self.chirps)?;
        let mut tokens = lock(&self.refresh_tokens)?;

        let removed = users.len() as u64;
        users.clear();
        chirps.clear();
        tokens.clear();
        Ok(removed)
    }
}

#[async_trait]
impl ChirpRepository for MemoryStore {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, StoreError> {
        if !lock(&self.users)?.contains_key(&user_id) {
            return Err(StoreError::Query(format!("no account {} for chirp", user_id)));
        }

        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        lock(&self.chirps)?.push(chirp.clone());
        Ok(chirp)
    }

    async fn list(&self, author: Option<Uuid>, order: SortOrder) -> Result<Vec<Chirp>, StoreError> {
        let chirps = lock(&self.chirps)?;
        let mut selected: Vec<Chirp> = chirps
            .iter()
            .filter(|c| author.map_or(true, |id| c.user_id == id))
            .cloned()
            .collect();

        // stable sort keeps insertion order for equal timestamps
        selected.sort_by_key(|c| c.created_at);
        if order == SortOrder::Descending {
            selected.reverse();
        }
        Ok(selected)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, StoreError> {
        Ok(lock(&self.chirps)?.iter().find(|c| c.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut chirps = lock(&self.chirps)?;
        let position = chirps
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        chirps.remove(position);
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        if tokens.contains_key(&record.token) {
            return Err(StoreError::UniqueViolation("refresh token already exists".to_string()));
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(lock(&self.refresh_tokens)?.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        let record = tokens.get_mut(token).ok_or(StoreError::NotFound)?;
        if record.revoked_at.is_none() {
            record.revoked_at = Some(revoked_at);
        }
        Ok(())
    }
}

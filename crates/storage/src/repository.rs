use async_trait::async_trait;
use catapult_core::model::{
    Cat, CatId, PhotoUrl, QuizHistory, QuizMode, QuizResult, UserId, UserProfiles,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local cache of the remote cat catalog and its photos.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert or replace cat records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be stored.
    async fn upsert_cats(&self, cats: &[Cat]) -> Result<(), StorageError>;

    /// All cached cats, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn list_cats(&self) -> Result<Vec<Cat>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn get_cat(&self, id: &CatId) -> Result<Option<Cat>, StorageError>;

    /// Cached photos for a cat, in insertion order. Empty when none cached.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn photos_for(&self, id: &CatId) -> Result<Vec<PhotoUrl>, StorageError>;

    /// Cache photos for a cat. Already cached URLs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the cat is not cached.
    async fn insert_photos(&self, id: &CatId, photos: &[PhotoUrl]) -> Result<(), StorageError>;
}

/// Per-user, per-mode result log.
///
/// `append` must be atomic per `(user, mode)`: concurrent appends all land.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a result and return the updated history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append(
        &self,
        user: UserId,
        mode: QuizMode,
        result: &QuizResult,
    ) -> Result<QuizHistory, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn read(&self, user: UserId, mode: QuizMode) -> Result<QuizHistory, StorageError>;

    /// Best score per mode for one user (0.0 for modes never played).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn best_results(&self, user: UserId) -> Result<Vec<(QuizMode, f64)>, StorageError> {
        let mut out = Vec::with_capacity(QuizMode::ALL.len());
        for mode in QuizMode::ALL {
            out.push((mode, self.read(user, mode).await?.best_result()));
        }
        Ok(out)
    }
}

/// Account list and the active pick.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on read failure.
    async fn load_profiles(&self) -> Result<UserProfiles, StorageError>;

    /// Replace the stored account list. Users absent from `profiles` are
    /// deleted together with their history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profiles cannot be stored.
    async fn save_profiles(&self, profiles: &UserProfiles) -> Result<(), StorageError>;
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    cats: Arc<Mutex<BTreeMap<CatId, Cat>>>,
    photos: Arc<Mutex<HashMap<CatId, Vec<PhotoUrl>>>>,
    history: Arc<Mutex<HashMap<(UserId, QuizMode), QuizHistory>>>,
    profiles: Arc<Mutex<UserProfiles>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn upsert_cats(&self, cats: &[Cat]) -> Result<(), StorageError> {
        let mut guard = self.cats.lock().map_err(poisoned)?;
        for cat in cats {
            guard.insert(cat.id().clone(), cat.clone());
        }
        Ok(())
    }

    async fn list_cats(&self) -> Result<Vec<Cat>, StorageError> {
        let guard = self.cats.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn get_cat(&self, id: &CatId) -> Result<Option<Cat>, StorageError> {
        let guard = self.cats.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn photos_for(&self, id: &CatId) -> Result<Vec<PhotoUrl>, StorageError> {
        let guard = self.photos.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned().unwrap_or_default())
    }

    async fn insert_photos(&self, id: &CatId, photos: &[PhotoUrl]) -> Result<(), StorageError> {
        if !self.cats.lock().map_err(poisoned)?.contains_key(id) {
            return Err(StorageError::NotFound);
        }
        let mut guard = self.photos.lock().map_err(poisoned)?;
        let cached = guard.entry(id.clone()).or_default();
        for photo in photos {
            if !cached.contains(photo) {
                cached.push(photo.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append(
        &self,
        user: UserId,
        mode: QuizMode,
        result: &QuizResult,
    ) -> Result<QuizHistory, StorageError> {
        let mut guard = self.history.lock().map_err(poisoned)?;
        let history = guard.entry((user, mode)).or_default();
        history.push(result.clone());
        Ok(history.clone())
    }

    async fn read(&self, user: UserId, mode: QuizMode) -> Result<QuizHistory, StorageError> {
        let guard = self.history.lock().map_err(poisoned)?;
        Ok(guard.get(&(user, mode)).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn load_profiles(&self) -> Result<UserProfiles, StorageError> {
        let guard = self.profiles.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_profiles(&self, profiles: &UserProfiles) -> Result<(), StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        let mut history = self.history.lock().map_err(poisoned)?;
        history.retain(|(user, _), _| profiles.get(*user).is_some());
        *guard = profiles.clone();
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let catalog: Arc<dyn CatalogRepository> = Arc::new(repo.clone());
        let history: Arc<dyn HistoryRepository> = Arc::new(repo.clone());
        let users: Arc<dyn UserRepository> = Arc::new(repo);
        Self {
            catalog,
            history,
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::model::User;
    use catapult_core::time::fixed_now;

    fn build_cat(id: &str, name: &str) -> Cat {
        Cat::new(CatId::new(id).unwrap(), name, "", "", "Calm, Loyal, Playful").unwrap()
    }

    fn photo(n: u32) -> PhotoUrl {
        PhotoUrl::parse(format!("https://cdn.example.com/{n}.jpg")).unwrap()
    }

    #[tokio::test]
    async fn photos_deduplicate_and_require_cat() {
        let repo = InMemoryRepository::new();
        let cat = build_cat("beng", "Bengal");
        repo.upsert_cats(std::slice::from_ref(&cat)).await.unwrap();

        repo.insert_photos(cat.id(), &[photo(1), photo(2)]).await.unwrap();
        repo.insert_photos(cat.id(), &[photo(2), photo(3)]).await.unwrap();
        assert_eq!(repo.photos_for(cat.id()).await.unwrap(), vec![photo(1), photo(2), photo(3)]);

        let missing = CatId::new("nope").unwrap();
        assert!(matches!(
            repo.insert_photos(&missing, &[photo(1)]).await,
            Err(StorageError::NotFound)
        ));
        assert!(repo.photos_for(&missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_returns_history_with_best() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        for score in [40.0, 75.5, 12.0] {
            let result = QuizResult::new(score, fixed_now()).unwrap();
            let history = repo.append(user, QuizMode::GuessCat, &result).await.unwrap();
            assert!(history.best_result() >= score);
        }
        let history = repo.read(user, QuizMode::GuessCat).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.best_result(), 75.5);
        assert!(repo.read(user, QuizMode::GuessFact).await.unwrap().is_empty());

        let best = repo.best_results(user).await.unwrap();
        assert!(best.contains(&(QuizMode::GuessCat, 75.5)));
        assert!(best.contains(&(QuizMode::LeftRightCat, 0.0)));
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_lose_updates() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(7);
        let mut handles = Vec::new();
        for i in 0..32_u32 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let result = QuizResult::new(f64::from(i), fixed_now()).unwrap();
                repo.append(user, QuizMode::GuessFact, &result).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let history = repo.read(user, QuizMode::GuessFact).await.unwrap();
        assert_eq!(history.len(), 32);
        assert_eq!(history.best_result(), 31.0);
    }

    #[tokio::test]
    async fn removing_user_drops_history() {
        let repo = InMemoryRepository::new();
        let mut profiles = UserProfiles::new();
        let mia = User::new(UserId::new(1), "mia", "Mia", "").unwrap();
        profiles.add(mia).unwrap();
        repo.save_profiles(&profiles).await.unwrap();

        let result = QuizResult::new(10.0, fixed_now()).unwrap();
        repo.append(UserId::new(1), QuizMode::GuessCat, &result).await.unwrap();

        profiles.remove(UserId::new(1)).unwrap();
        repo.save_profiles(&profiles).await.unwrap();
        assert!(repo.read(UserId::new(1), QuizMode::GuessCat).await.unwrap().is_empty());
        assert!(repo.load_profiles().await.unwrap().users().is_empty());
    }
}

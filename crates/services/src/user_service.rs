use std::sync::Arc;

use catapult_core::model::{User, UserId, UserProfiles};
use storage::repository::UserRepository;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::UserServiceError;

/// Account management. Updates are load-modify-save, serialized by a lock.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    write_lock: Mutex<()>,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            write_lock: Mutex::new(()),
        }
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` on read failure.
    pub async fn profiles(&self) -> Result<UserProfiles, UserServiceError> {
        Ok(self.users.load_profiles().await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` on read failure.
    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.profiles().await?.users().to_vec())
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` on read failure.
    pub async fn active_user(&self) -> Result<Option<User>, UserServiceError> {
        Ok(self.profiles().await?.active().cloned())
    }

    /// Create an account and make it active.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for invalid fields or a taken nickname.
    pub async fn add_user(
        &self,
        nickname: &str,
        name: &str,
        email: &str,
    ) -> Result<User, UserServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut profiles = self.users.load_profiles().await?;
        let user = User::new(profiles.next_id(), nickname, name, email)?;
        profiles.add(user.clone())?;
        self.users.save_profiles(&profiles).await?;
        info!(user_id = %user.id(), nickname = user.nickname(), "user added");
        Ok(user)
    }

    /// Delete an account and its history.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` if the id is unknown.
    pub async fn remove_user(&self, id: UserId) -> Result<User, UserServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut profiles = self.users.load_profiles().await?;
        let removed = profiles.remove(id)?;
        self.users.save_profiles(&profiles).await?;
        info!(user_id = %id, "user removed");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::User` if the id is unknown.
    pub async fn select_user(&self, id: UserId) -> Result<(), UserServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut profiles = self.users.load_profiles().await?;
        profiles.select(id)?;
        self.users.save_profiles(&profiles).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::model::UserError;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn add_select_remove() {
        let service = UserService::new(Arc::new(InMemoryRepository::new()));
        assert!(service.active_user().await.unwrap().is_none());

        let mia = service.add_user("mia", "Mia", "mia@example.com").await.unwrap();
        let leo = service.add_user("leo", "", "").await.unwrap();
        assert_eq!(service.active_user().await.unwrap(), Some(leo.clone()));

        service.select_user(mia.id()).await.unwrap();
        assert_eq!(service.active_user().await.unwrap(), Some(mia.clone()));

        service.remove_user(mia.id()).await.unwrap();
        assert_eq!(service.active_user().await.unwrap(), Some(leo));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let service = UserService::new(Arc::new(InMemoryRepository::new()));
        service.add_user("mia", "", "").await.unwrap();

        assert!(matches!(
            service.add_user("Mia", "", "").await,
            Err(UserServiceError::User(UserError::DuplicateNickname(_)))
        ));
        assert!(matches!(
            service.select_user(UserId::new(42)).await,
            Err(UserServiceError::User(UserError::UnknownUser(_)))
        ));
    }

    #[tokio::test]
    async fn concurrent_adds_get_distinct_ids() {
        let service = Arc::new(UserService::new(Arc::new(InMemoryRepository::new())));
        let mut handles = Vec::new();
        for i in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.add_user(&format!("player{i}"), "", "").await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}

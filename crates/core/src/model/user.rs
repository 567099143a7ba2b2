use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("nickname cannot be empty")]
    EmptyNickname,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("nickname already taken: {0}")]
    DuplicateNickname(String),

    #[error("unknown user: {0}")]
    UnknownUser(UserId),
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A local player account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    nickname: String,
    name: String,
    email: String,
}

impl User {
    /// # Errors
    ///
    /// Returns `UserError` if the nickname is blank or the email is malformed.
    pub fn new(
        id: UserId,
        nickname: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, UserError> {
        let nickname = nickname.into().trim().to_owned();
        if nickname.is_empty() {
            return Err(UserError::EmptyNickname);
        }
        let email = email.into().trim().to_owned();
        if !email.is_empty() && !looks_like_email(&email) {
            return Err(UserError::InvalidEmail(email));
        }
        Ok(Self {
            id,
            nickname,
            name: name.into().trim().to_owned(),
            email,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

//
// ─── PROFILES ──────────────────────────────────────────────────────────────────
//

/// The account list plus which account is currently playing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfiles {
    users: Vec<User>,
    active: Option<UserId>,
}

impl UserProfiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from storage. An active id that matches no user is dropped.
    #[must_use]
    pub fn from_persisted(users: Vec<User>, active: Option<UserId>) -> Self {
        let active = active.filter(|id| users.iter().any(|u| u.id() == *id));
        Self { users, active }
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    #[must_use]
    pub fn active_id(&self) -> Option<UserId> {
        self.active
    }

    #[must_use]
    pub fn active(&self) -> Option<&User> {
        let id = self.active?;
        self.users.iter().find(|u| u.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id() == id)
    }

    /// Next free id (one past the current maximum).
    #[must_use]
    pub fn next_id(&self) -> UserId {
        let max = self.users.iter().map(|u| u.id().value()).max().unwrap_or(0);
        UserId::new(max.saturating_add(1))
    }

    /// Add a user and make it the active one.
    ///
    /// # Errors
    ///
    /// Returns `UserError::DuplicateNickname` if the nickname is already used.
    pub fn add(&mut self, user: User) -> Result<(), UserError> {
        if self
            .users
            .iter()
            .any(|u| u.nickname().eq_ignore_ascii_case(user.nickname()))
        {
            return Err(UserError::DuplicateNickname(user.nickname().to_owned()));
        }
        self.active = Some(user.id());
        self.users.push(user);
        Ok(())
    }

    /// Remove a user. If it was active, the last remaining user becomes active.
    ///
    /// # Errors
    ///
    /// Returns `UserError::UnknownUser` if no user has this id.
    pub fn remove(&mut self, id: UserId) -> Result<User, UserError> {
        let idx = self
            .users
            .iter()
            .position(|u| u.id() == id)
            .ok_or(UserError::UnknownUser(id))?;
        let removed = self.users.remove(idx);
        if self.active == Some(id) {
            self.active = self.users.last().map(User::id);
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `UserError::UnknownUser` if no user has this id.
    pub fn select(&mut self, id: UserId) -> Result<(), UserError> {
        if self.get(id).is_none() {
            return Err(UserError::UnknownUser(id));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.users.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, nick: &str) -> User {
        User::new(UserId::new(id), nick, "Name", format!("{nick}@example.com")).unwrap()
    }

    #[test]
    fn validates_fields() {
        assert_eq!(
            User::new(UserId::new(1), " ", "", "").unwrap_err(),
            UserError::EmptyNickname
        );
        assert!(matches!(
            User::new(UserId::new(1), "mia", "", "mia-at-example").unwrap_err(),
            UserError::InvalidEmail(_)
        ));
        assert!(User::new(UserId::new(1), "mia", "", "").is_ok());
    }

    #[test]
    fn add_makes_user_active() {
        let mut profiles = UserProfiles::new();
        profiles.add(user(1, "mia")).unwrap();
        profiles.add(user(2, "leo")).unwrap();
        assert_eq!(profiles.active_id(), Some(UserId::new(2)));
        assert_eq!(profiles.next_id(), UserId::new(3));
    }

    #[test]
    fn duplicate_nickname_rejected() {
        let mut profiles = UserProfiles::new();
        profiles.add(user(1, "mia")).unwrap();
        let err = profiles.add(user(2, "MIA")).unwrap_err();
        assert_eq!(err, UserError::DuplicateNickname("MIA".into()));
    }

    #[test]
    fn removing_active_falls_back_to_last() {
        let mut profiles = UserProfiles::new();
        profiles.add(user(1, "mia")).unwrap();
        profiles.add(user(2, "leo")).unwrap();
        profiles.add(user(3, "kit")).unwrap();
        profiles.remove(UserId::new(3)).unwrap();
        assert_eq!(profiles.active_id(), Some(UserId::new(2)));

        profiles.select(UserId::new(1)).unwrap();
        profiles.remove(UserId::new(2)).unwrap();
        assert_eq!(profiles.active_id(), Some(UserId::new(1)));

        profiles.remove(UserId::new(1)).unwrap();
        assert!(profiles.active().is_none());
    }

    #[test]
    fn stale_active_id_dropped_on_rehydrate() {
        let profiles = UserProfiles::from_persisted(vec![user(1, "mia")], Some(UserId::new(9)));
        assert!(profiles.active_id().is_none());
    }
}

use std::collections::HashSet;

use catapult_core::model::{UserId, UserProfiles};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, id_i64, map_user_row, ser, user_id_from_i64};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn load_profiles(&self) -> Result<UserProfiles, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, nickname, name, email
                FROM users
                ORDER BY position ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;
        let users = rows.iter().map(map_user_row).collect::<Result<Vec<_>, _>>()?;

        let active = sqlx::query("SELECT active_user_id FROM user_profile WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?
            .map(|row| row.try_get::<Option<i64>, _>("active_user_id").map_err(ser))
            .transpose()?
            .flatten()
            .map(user_id_from_i64)
            .transpose()?;

        Ok(UserProfiles::from_persisted(users, active))
    }

    async fn save_profiles(&self, profiles: &UserProfiles) -> Result<(), StorageError> {
        let keep: HashSet<UserId> = profiles.users().iter().map(|u| u.id()).collect();
        let mut tx = self.pool.begin().await.map_err(db)?;

        let stored: Vec<i64> = sqlx::query_scalar("SELECT id FROM users")
            .fetch_all(&mut *tx)
            .await
            .map_err(db)?;
        for id in stored {
            if !keep.contains(&user_id_from_i64(id)?) {
                // Cascades to quiz_results.
                sqlx::query("DELETE FROM users WHERE id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db)?;
            }
        }

        for (position, user) in profiles.users().iter().enumerate() {
            let position = i64::try_from(position).map_err(ser)?;
            sqlx::query(
                r"
                INSERT INTO users (id, nickname, name, email, position)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    nickname = excluded.nickname,
                    name = excluded.name,
                    email = excluded.email,
                    position = excluded.position
                ",
            )
            .bind(id_i64("user_id", user.id().value())?)
            .bind(user.nickname())
            .bind(user.name())
            .bind(user.email())
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        let active = profiles
            .active_id()
            .map(|id| id_i64("active_user_id", id.value()))
            .transpose()?;
        sqlx::query(
            r"
                INSERT INTO user_profile (id, active_user_id)
                VALUES (1, ?1)
                ON CONFLICT(id) DO UPDATE SET active_user_id = excluded.active_user_id
            ",
        )
        .bind(active)
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        tx.commit().await.map_err(db)?;
        Ok(())
    }
}

use catapult_core::model::{Cat, CatId, PhotoUrl};

use super::SqliteRepository;
use super::mapping::{db, map_cat_row, map_photo_row};
use crate::repository::{CatalogRepository, StorageError};

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn upsert_cats(&self, cats: &[Cat]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db)?;
        for cat in cats {
            sqlx::query(
                r"
                INSERT INTO cats (id, name, description, alt_names, temperament)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    alt_names = excluded.alt_names,
                    temperament = excluded.temperament
                ",
            )
            .bind(cat.id().as_str())
            .bind(cat.name())
            .bind(cat.description())
            .bind(cat.alt_names_raw())
            .bind(cat.temperament_raw())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }
        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn list_cats(&self) -> Result<Vec<Cat>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, description, alt_names, temperament
                FROM cats
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_cat_row).collect()
    }

    async fn get_cat(&self, id: &CatId) -> Result<Option<Cat>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, name, description, alt_names, temperament
                FROM cats
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.as_ref().map(map_cat_row).transpose()
    }

    async fn photos_for(&self, id: &CatId) -> Result<Vec<PhotoUrl>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT url
                FROM cat_photos
                WHERE cat_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_photo_row).collect()
    }

    async fn insert_photos(&self, id: &CatId, photos: &[PhotoUrl]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db)?;

        let known = sqlx::query("SELECT 1 FROM cats WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db)?;
        if known.is_none() {
            return Err(StorageError::NotFound);
        }

        for photo in photos {
            sqlx::query(
                r"
                INSERT INTO cat_photos (cat_id, url)
                VALUES (?1, ?2)
                ON CONFLICT(cat_id, url) DO NOTHING
                ",
            )
            .bind(id.as_str())
            .bind(photo.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }
        tx.commit().await.map_err(db)?;
        Ok(())
    }
}

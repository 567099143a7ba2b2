use catapult_core::model::{Cat, CatId, PhotoUrl, QuizMode, QuizResult, User, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Classifies driver errors. Constraint violations get their own variants so
/// callers can tell bad input from a broken connection.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(d) if d.is_foreign_key_violation() => StorageError::NotFound,
        Some(d) if d.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn map_cat_row(row: &SqliteRow) -> Result<Cat, StorageError> {
    let id = CatId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    Cat::new(
        id,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        row.try_get::<String, _>("alt_names").map_err(ser)?,
        row.try_get::<String, _>("temperament").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_photo_row(row: &SqliteRow) -> Result<PhotoUrl, StorageError> {
    PhotoUrl::parse(row.try_get::<String, _>("url").map_err(ser)?).map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    User::new(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("nickname").map_err(ser)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("email").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<QuizResult, StorageError> {
    QuizResult::new(
        row.try_get::<f64, _>("score").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn parse_mode(s: &str) -> Result<QuizMode, StorageError> {
    s.parse::<QuizMode>().map_err(ser)
}

use catapult_core::model::{QuizHistory, QuizMode, QuizResult, UserId};
use sqlx::{Executor, Sqlite};

use super::SqliteRepository;
use super::mapping::{db, id_i64, map_result_row, parse_mode, ser};
use crate::repository::{HistoryRepository, StorageError};

async fn load_history<'e, E>(
    executor: E,
    user_id: i64,
    mode: QuizMode,
) -> Result<QuizHistory, StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r"
            SELECT score, created_at
            FROM quiz_results
            WHERE user_id = ?1 AND mode = ?2
            ORDER BY id ASC
        ",
    )
    .bind(user_id)
    .bind(mode.as_str())
    .fetch_all(executor)
    .await
    .map_err(db)?;

    let results = rows
        .iter()
        .map(map_result_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QuizHistory::from_persisted(results))
}

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append(
        &self,
        user: UserId,
        mode: QuizMode,
        result: &QuizResult,
    ) -> Result<QuizHistory, StorageError> {
        let user_id = id_i64("user_id", user.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query(
            r"
                INSERT INTO quiz_results (user_id, mode, score, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user_id)
        .bind(mode.as_str())
        .bind(result.score())
        .bind(result.created_at())
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        let history = load_history(&mut *tx, user_id, mode).await?;
        tx.commit().await.map_err(db)?;
        Ok(history)
    }

    async fn read(&self, user: UserId, mode: QuizMode) -> Result<QuizHistory, StorageError> {
        load_history(&self.pool, id_i64("user_id", user.value())?, mode).await
    }

    async fn best_results(&self, user: UserId) -> Result<Vec<(QuizMode, f64)>, StorageError> {
        let rows: Vec<(String, f64)> = sqlx::query_as(
            r"
                SELECT mode, MAX(score)
                FROM quiz_results
                WHERE user_id = ?1
                GROUP BY mode
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut best: Vec<(QuizMode, f64)> = QuizMode::ALL.iter().map(|m| (*m, 0.0)).collect();
        for (mode, score) in rows {
            let mode = parse_mode(&mode)?;
            if !score.is_finite() {
                return Err(ser(format!("invalid score: {score}")));
            }
            if let Some(slot) = best.iter_mut().find(|(m, _)| *m == mode) {
                slot.1 = score;
            }
        }
        Ok(best)
    }
}

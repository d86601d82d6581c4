//! Document index load/save.

use crate::error::PersistenceError;
use crate::types::Document;
use crate::{Error, Result};

use super::{Database, DocumentRow};

impl Database {
    /// Load the whole index in saved order
    pub async fn load_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT position, id, title, safe_title, day, month, year, transcript,
                   image_ref, alt_text, origin_url, news, payload
            FROM documents
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        rows.into_iter().map(Document::try_from).collect()
    }

    /// Replace the whole index with `documents`, keeping their order
    ///
    /// Runs in one transaction: on any failure the previous index is left intact.
    /// Documents with `id == 0` are rejected before anything is written.
    pub async fn save_documents(&self, documents: &[Document]) -> Result<usize> {
        if let Some(unresolved) = documents.iter().find(|d| !d.is_resolved()) {
            return Err(Error::Persistence(PersistenceError::InvalidDocument {
                id: unresolved.id,
                reason: "document id is unresolved".to_string(),
            }));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Sqlx)?;

        sqlx::query("DELETE FROM documents")
            .execute(&mut *tx)
            .await
            .map_err(Error::Sqlx)?;

        for (position, document) in documents.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO documents (
                    position, id, title, safe_title, day, month, year, transcript,
                    image_ref, alt_text, origin_url, news, payload
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(i64::from(document.id))
            .bind(&document.title)
            .bind(&document.safe_title)
            .bind(&document.day)
            .bind(&document.month)
            .bind(&document.year)
            .bind(&document.transcript)
            .bind(&document.image_ref)
            .bind(&document.alt_text)
            .bind(&document.origin_url)
            .bind(&document.news)
            .bind(&document.payload)
            .execute(&mut *tx)
            .await
            .map_err(Error::Sqlx)?;
        }

        tx.commit().await.map_err(Error::Sqlx)?;

        tracing::debug!(count = documents.len(), "Index saved");
        Ok(documents.len())
    }

    /// Number of documents in the saved index
    pub async fn count_documents(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}

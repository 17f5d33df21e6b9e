//! Document repository implementation.
//!
//! The status column is the state machine: every transition is a single
//! UPDATE guarded by the expected previous status, so concurrent or
//! out-of-order writers cannot move a record backward. Zero rows affected
//! means the guard failed, and the error distinguishes a missing record
//! from an invalid transition.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use docmill_core::{
    CreateDocumentRequest, DocumentRecord, DocumentRepository, DocumentStatus, Error,
    ProcessingMode, ProcessingOptions, Result,
};

/// PostgreSQL implementation of DocumentRepository.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    /// Create a new PgDocumentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<DocumentRecord> {
        let status: String = row.try_get("status")?;
        let mode: String = row.try_get("processing_mode")?;
        Ok(DocumentRecord {
            id: row.try_get("id")?,
            filename: row.try_get("filename")?,
            status: DocumentStatus::parse(&status)?,
            processing_options: ProcessingOptions {
                ocr_enabled: row.try_get("ocr_enabled")?,
                processing_mode: ProcessingMode::parse(&mode)
                    .map_err(|_| Error::Internal(format!("unknown processing mode: {mode}")))?,
            },
            file_size: row.try_get("file_size")?,
            content_type: row.try_get("content_type")?,
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
            error_message: row.try_get("error_message")?,
        })
    }

    /// Resolve a zero-rows-affected transition into the right error:
    /// missing record vs. wrong current status.
    async fn transition_conflict(&self, id: Uuid, target: DocumentStatus) -> Error {
        match self.fetch(id).await {
            Ok(doc) => Error::InvalidState(format!(
                "Document {} cannot transition to '{}' from status '{}'",
                id, target, doc.status
            )),
            Err(e) => e,
        }
    }

    /// Liveness probe for health checks.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, status, ocr_enabled, processing_mode, file_size, content_type)
            VALUES ($1, $2, 'queued', $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&req.filename)
        .bind(req.processing_options.ocr_enabled)
        .bind(req.processing_options.processing_mode.as_str())
        .bind(req.file_size)
        .bind(&req.content_type)
        .execute(&self.pool)
        .await?;

        debug!(document_id = %id, filename = %req.filename, "Document record created");
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<DocumentRecord> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, status, ocr_enabled, processing_mode,
                   file_size, content_type, created_at, completed_at, error_message
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::DocumentNotFound(id))?;

        Self::map_row(&row)
    }

    async fn mark_processing(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET status = 'processing' WHERE id = $1 AND status = 'queued'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(id, DocumentStatus::Processing).await);
        }
        debug!(document_id = %id, "Document transitioned to processing");
        Ok(())
    }

    async fn mark_complete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'complete', completed_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(id, DocumentStatus::Complete).await);
        }
        debug!(document_id = %id, "Document transitioned to complete");
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'failed', completed_at = now(), error_message = $2
            WHERE id = $1 AND status IN ('queued', 'processing')
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(id, DocumentStatus::Failed).await);
        }
        debug!(document_id = %id, error_message, "Document transitioned to failed");
        Ok(())
    }
}

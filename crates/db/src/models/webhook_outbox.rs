use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::webhook_outbox;

#[derive(Debug, Error)]
pub enum WebhookOutboxError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Outbox entry not found")]
    NotFound,
}

/// A durable record of one webhook delivery. Entries are written in the same
/// transaction as the state change that triggers them, then drained by the
/// dispatcher worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOutboxEntry {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

impl WebhookOutboxEntry {
    fn from_model(model: webhook_outbox::Model) -> Self {
        Self {
            id: model.uuid,
            submission_id: model.submission_uuid,
            payload: model.payload,
            created_at: model.created_at.into(),
            dispatched_at: model.dispatched_at.map(Into::into),
            attempts: model.attempts,
            last_error: model.last_error,
        }
    }

    pub async fn enqueue<C: ConnectionTrait>(
        db: &C,
        submission_id: Uuid,
        payload: JsonValue,
    ) -> Result<Self, DbErr> {
        let active = webhook_outbox::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            submission_uuid: Set(submission_id),
            payload: Set(payload),
            created_at: Set(Utc::now()),
            dispatched_at: Set(None),
            attempts: Set(0),
            last_error: Set(None),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Oldest-first batch of entries still awaiting delivery. Entries that
    /// have burned through `max_attempts` are left for operator inspection.
    pub async fn fetch_undispatched<C: ConnectionTrait>(
        db: &C,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Self>, DbErr> {
        let records = webhook_outbox::Entity::find()
            .filter(webhook_outbox::Column::DispatchedAt.is_null())
            .filter(webhook_outbox::Column::Attempts.lt(max_attempts))
            .order_by_asc(webhook_outbox::Column::CreatedAt)
            .order_by_asc(webhook_outbox::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn mark_dispatched<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<(), WebhookOutboxError> {
        let result = webhook_outbox::Entity::update_many()
            .filter(webhook_outbox::Column::Uuid.eq(id))
            .col_expr(webhook_outbox::Column::DispatchedAt, Expr::value(Utc::now()))
            .col_expr(webhook_outbox::Column::LastError, Expr::value(Option::<String>::None))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(WebhookOutboxError::NotFound);
        }
        Ok(())
    }

    pub async fn mark_failed<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        error: &str,
    ) -> Result<(), WebhookOutboxError> {
        let result = webhook_outbox::Entity::update_many()
            .filter(webhook_outbox::Column::Uuid.eq(id))
            .col_expr(
                webhook_outbox::Column::Attempts,
                Expr::col(webhook_outbox::Column::Attempts).add(1),
            )
            .col_expr(webhook_outbox::Column::LastError, Expr::value(error.to_string()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(WebhookOutboxError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_submission<C: ConnectionTrait>(
        db: &C,
        submission_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = webhook_outbox::Entity::find()
            .filter(webhook_outbox::Column::SubmissionUuid.eq(submission_id))
            .order_by_asc(webhook_outbox::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }
}

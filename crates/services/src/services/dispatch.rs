use std::time::Duration;

use db::ConnectionTrait;
use db::models::submission::Submission;
use db::models::webhook_outbox::{WebhookOutboxEntry, WebhookOutboxError};
use db::sea_orm::{DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::services::config::WebhookConfig;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Outbox(#[from] WebhookOutboxError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Submission is missing the fields the generation workflow needs")]
    IncompleteSubmission,
}

/// Body posted to the generation workflow. The field names are the wire
/// contract the workflow was built against, so they stay as-is even though
/// the rest of the codebase uses English names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPayload {
    #[serde(rename = "type_organisme")]
    pub organism_type: String,
    #[serde(rename = "kleur_organisme")]
    pub color: String,
    #[serde(rename = "hoe_groot_organisme")]
    pub size: String,
    #[serde(rename = "hoeveel_organism")]
    pub quantity: String,
    #[serde(rename = "beschrijving_landschap_user")]
    pub landscape: String,
    #[serde(rename = "kenmerken_user")]
    pub features: String,
    pub user_id: Uuid,
    #[serde(rename = "image_id")]
    pub submission_id: Uuid,
    #[serde(rename = "url_original_image")]
    pub original_image_url: String,
}

impl GenerationPayload {
    /// Assembles the payload from a submission whose profile is complete.
    pub fn from_submission(submission: &Submission) -> Result<Self, DispatchError> {
        let profile = (|| {
            Some(Self {
                organism_type: submission.organism_type.clone()?,
                color: submission.color.clone()?,
                size: submission.size.clone()?,
                quantity: submission.quantity.clone()?,
                landscape: submission.landscape.clone()?,
                features: submission.features.clone()?,
                user_id: submission.user_id,
                submission_id: submission.id,
                original_image_url: submission.original_image_url.clone()?,
            })
        })();
        profile.ok_or(DispatchError::IncompleteSubmission)
    }
}

/// Drains the webhook outbox toward the configured generation workflow.
/// Deliveries are queued durably first; the worker retries failures on the
/// next sweep until the attempt cap is hit.
#[derive(Clone)]
pub struct WebhookDispatcher {
    conn: DatabaseConnection,
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookDispatcher {
    pub fn new(conn: DatabaseConnection, config: WebhookConfig) -> Self {
        Self {
            conn,
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Queues a delivery. Takes the caller's connection so the entry lands
    /// in the same transaction as the submission write that triggered it.
    pub async fn enqueue<C: ConnectionTrait>(
        db: &C,
        payload: &GenerationPayload,
    ) -> Result<WebhookOutboxEntry, DispatchError> {
        let entry = WebhookOutboxEntry::enqueue(
            db,
            payload.submission_id,
            serde_json::to_value(payload)?,
        )
        .await?;
        Ok(entry)
    }

    pub fn spawn_worker(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let sweep = Duration::from_secs(self.config.sweep_interval_secs);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Webhook dispatcher stopping");
                        break;
                    }
                    _ = tokio::time::sleep(sweep) => {
                        if let Err(err) = self.flush_pending().await {
                            tracing::error!("Webhook sweep failed: {}", err);
                        }
                    }
                }
            }
        })
    }

    /// Delivers every queued entry still under the attempt cap. Returns the
    /// number of successful deliveries.
    pub async fn flush_pending(&self) -> Result<usize, DispatchError> {
        let Some(url) = self.config.url.as_deref() else {
            tracing::debug!("No webhook URL configured, leaving outbox queued");
            return Ok(0);
        };

        let pending = db::retry_on_db_busy(|| {
            WebhookOutboxEntry::fetch_undispatched(
                &self.conn,
                self.config.batch_size,
                self.config.max_attempts,
            )
        })
        .await?;

        let mut delivered = 0;
        for entry in pending {
            match self.post(url, &entry).await {
                Ok(()) => {
                    WebhookOutboxEntry::mark_dispatched(&self.conn, entry.id).await?;
                    tracing::info!(
                        submission_id = %entry.submission_id,
                        "Webhook delivered"
                    );
                    delivered += 1;
                }
                Err(reason) => {
                    tracing::warn!(
                        submission_id = %entry.submission_id,
                        attempts = entry.attempts + 1,
                        "Webhook delivery failed: {}",
                        reason
                    );
                    WebhookOutboxEntry::mark_failed(&self.conn, entry.id, &reason).await?;
                }
            }
        }
        Ok(delivered)
    }

    async fn post(&self, url: &str, entry: &WebhookOutboxEntry) -> Result<(), String> {
        let response = self
            .client
            .post(url)
            .json(&entry.payload)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("webhook returned {}", response.status()));
        }
        Ok(())
    }
}

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::workshop_session,
    models::{ids, submission::Submission, workshop::Workshop},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Session not found")]
    NotFound,
    #[error("Session has expired")]
    Expired,
    #[error("Workshop not found")]
    WorkshopNotFound,
}

/// A server-held participant session. The session id is the only credential
/// the browser keeps; everything else lives in this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workshop_id: Uuid,
    pub submission_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl WorkshopSession {
    fn from_model(model: workshop_session::Model, workshop_id: Uuid) -> Self {
        Self {
            id: model.uuid,
            user_id: model.user_id,
            workshop_id,
            submission_id: model.submission_uuid,
            created_at: model.created_at.into(),
            expires_at: model.expires_at.into(),
        }
    }

    /// Starts a participant journey: mints a user id, opens a blank
    /// submission, and binds both to a session with the given TTL.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        workshop: &Workshop,
        ttl_secs: i64,
    ) -> Result<(Self, Submission), SessionError> {
        let workshop_row_id = ids::workshop_id_by_uuid(db, workshop.id)
            .await?
            .ok_or(SessionError::WorkshopNotFound)?;

        let user_id = Uuid::new_v4();
        let submission = Submission::create(db, user_id, workshop.id, None)
            .await
            .map_err(|err| match err {
                crate::models::submission::SubmissionError::Database(e) => {
                    SessionError::Database(e)
                }
                _ => SessionError::WorkshopNotFound,
            })?;

        let now = Utc::now();
        let active = workshop_session::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            workshop_id: Set(workshop_row_id),
            submission_uuid: Set(submission.id),
            created_at: Set(now),
            expires_at: Set(now + Duration::seconds(ttl_secs)),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok((Self::from_model(model, workshop.id), submission))
    }

    /// Loads a session, deleting it when past its expiry. A stale id surfaces
    /// as `Expired` so the caller can tell the participant to start over.
    pub async fn find_valid<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Self, SessionError> {
        let record = workshop_session::Entity::find()
            .filter(workshop_session::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(SessionError::NotFound)?;

        let expires_at: DateTime<Utc> = record.expires_at.into();
        if expires_at <= Utc::now() {
            workshop_session::Entity::delete_by_id(record.id).exec(db).await?;
            return Err(SessionError::Expired);
        }

        let workshop_uuid = ids::workshop_uuid_by_id(db, record.workshop_id)
            .await?
            .ok_or(SessionError::WorkshopNotFound)?;
        Ok(Self::from_model(record, workshop_uuid))
    }

    /// Points the session at a fresh submission. Used by the regenerate flow,
    /// which opens a new journey without forcing a new access-code entry.
    pub async fn rebind_submission<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        submission_id: Uuid,
    ) -> Result<Self, SessionError> {
        let record = workshop_session::Entity::find()
            .filter(workshop_session::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(SessionError::NotFound)?;
        let workshop_row_id = record.workshop_id;

        let mut model: workshop_session::ActiveModel = record.into();
        model.submission_uuid = Set(submission_id);
        let model = model.update(db).await?;

        let workshop_uuid = ids::workshop_uuid_by_id(db, workshop_row_id)
            .await?
            .ok_or(SessionError::WorkshopNotFound)?;
        Ok(Self::from_model(model, workshop_uuid))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = workshop_session::Entity::delete_many()
            .filter(workshop_session::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Removes every expired session row. Called periodically by the server.
    pub async fn sweep_expired<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        let result = workshop_session::Entity::delete_many()
            .filter(workshop_session::Column::ExpiresAt.lte(Utc::now()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::workshop::CreateWorkshop;

    async fn setup() -> (sea_orm::DatabaseConnection, Workshop) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let workshop = Workshop::create(
            &db,
            &CreateWorkshop {
                title: "Test".to_string(),
                access_code: "CODE".to_string(),
                active: None,
            },
        )
        .await
        .unwrap();
        (db, workshop)
    }

    #[tokio::test]
    async fn create_binds_session_to_fresh_submission() {
        let (db, workshop) = setup().await;

        let (session, submission) = WorkshopSession::create(&db, &workshop, 7200).await.unwrap();
        assert_eq!(session.workshop_id, workshop.id);
        assert_eq!(session.submission_id, submission.id);
        assert_eq!(session.user_id, submission.user_id);
        assert!(session.expires_at > session.created_at);

        let found = WorkshopSession::find_valid(&db, session.id).await.unwrap();
        assert_eq!(found.submission_id, submission.id);
    }

    #[tokio::test]
    async fn expired_session_is_deleted_and_reported() {
        let (db, workshop) = setup().await;

        let (session, _) = WorkshopSession::create(&db, &workshop, -1).await.unwrap();

        let err = WorkshopSession::find_valid(&db, session.id).await.unwrap_err();
        assert!(matches!(err, SessionError::Expired));

        // the row is gone; a second lookup no longer finds it at all
        let err = WorkshopSession::find_valid(&db, session.id).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn rebind_points_at_new_submission() {
        let (db, workshop) = setup().await;

        let (session, first) = WorkshopSession::create(&db, &workshop, 7200).await.unwrap();
        let second = Submission::create(&db, session.user_id, workshop.id, None)
            .await
            .unwrap();

        let rebound = WorkshopSession::rebind_submission(&db, session.id, second.id)
            .await
            .unwrap();
        assert_eq!(rebound.submission_id, second.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_rows() {
        let (db, workshop) = setup().await;

        let (expired, _) = WorkshopSession::create(&db, &workshop, -1).await.unwrap();
        let (alive, _) = WorkshopSession::create(&db, &workshop, 7200).await.unwrap();

        let removed = WorkshopSession::sweep_expired(&db).await.unwrap();
        assert_eq!(removed, 1);

        assert!(matches!(
            WorkshopSession::find_valid(&db, expired.id).await.unwrap_err(),
            SessionError::NotFound
        ));
        assert!(WorkshopSession::find_valid(&db, alive.id).await.is_ok());
    }
}

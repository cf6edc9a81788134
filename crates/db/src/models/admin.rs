use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::admin;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Admin not found")]
    NotFound,
    #[error("An admin with this email already exists")]
    DuplicateEmail,
}

#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    fn from_model(model: admin::Model) -> Self {
        Self {
            id: model.uuid,
            email: model.email,
            password_hash: model.password_hash,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        email: &str,
        password_hash: &str,
    ) -> Result<Self, AdminError> {
        let email = email.trim().to_lowercase();
        let existing = admin::Entity::find()
            .filter(admin::Column::Email.eq(email.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(AdminError::DuplicateEmail);
        }

        let active = admin::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = admin::Entity::find()
            .filter(admin::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = admin::Entity::find()
            .filter(admin::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// True once any admin account exists; gates the one-time setup endpoint.
    pub async fn any_exists<C: ConnectionTrait>(db: &C) -> Result<bool, DbErr> {
        let count = admin::Entity::find().count(db).await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn create_normalizes_email_and_rejects_duplicates() {
        let db = setup_db().await;
        assert!(!Admin::any_exists(&db).await.unwrap());

        let admin = Admin::create(&db, "  Beheer@Example.org ", "hash").await.unwrap();
        assert_eq!(admin.email, "beheer@example.org");
        assert!(Admin::any_exists(&db).await.unwrap());

        let found = Admin::find_by_email(&db, "BEHEER@example.org")
            .await
            .unwrap()
            .expect("admin by email");
        assert_eq!(found.id, admin.id);

        let err = Admin::create(&db, "beheer@example.org", "other").await.unwrap_err();
        assert!(matches!(err, AdminError::DuplicateEmail));
    }
}

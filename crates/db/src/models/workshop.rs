use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::workshop;

#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Workshop not found")]
    NotFound,
    #[error("A workshop with this access code already exists")]
    DuplicateAccessCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workshop {
    pub id: Uuid,
    pub title: String,
    pub access_code: String,
    pub active: bool,
    pub video_submission_count: i32,
    pub video_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkshop {
    pub title: String,
    pub access_code: String,
    pub active: Option<bool>,
}

impl Workshop {
    fn from_model(model: workshop::Model) -> Self {
        Self {
            id: model.uuid,
            title: model.title,
            access_code: model.access_code,
            active: model.active,
            video_submission_count: model.video_submission_count,
            video_generated_at: model.video_generated_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateWorkshop,
    ) -> Result<Self, WorkshopError> {
        let code = data.access_code.trim();
        let existing = workshop::Entity::find()
            .filter(workshop::Column::AccessCode.eq(code))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(WorkshopError::DuplicateAccessCode);
        }

        let now = Utc::now();
        let active = workshop::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set(data.title.clone()),
            access_code: Set(code.to_string()),
            active: Set(data.active.unwrap_or(true)),
            video_submission_count: Set(0),
            video_generated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = workshop::Entity::find()
            .order_by_desc(workshop::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = workshop::Entity::find()
            .filter(workshop::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_access_code<C: ConnectionTrait>(
        db: &C,
        access_code: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = workshop::Entity::find()
            .filter(workshop::Column::AccessCode.eq(access_code.trim()))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn set_active<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        active: bool,
    ) -> Result<Self, WorkshopError> {
        let record = workshop::Entity::find()
            .filter(workshop::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(WorkshopError::NotFound)?;

        let mut model: workshop::ActiveModel = record.into();
        model.active = Set(active);
        model.updated_at = Set(Utc::now());
        let model = model.update(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = workshop::Entity::delete_many()
            .filter(workshop::Column::Uuid.eq(id))
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

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn create_and_find_by_access_code_trims_input() {
        let db = setup_db().await;

        let workshop = Workshop::create(
            &db,
            &CreateWorkshop {
                title: "Futuristische planten".to_string(),
                access_code: "ABC123".to_string(),
                active: None,
            },
        )
        .await
        .unwrap();
        assert!(workshop.active);

        let found = Workshop::find_by_access_code(&db, "  ABC123  ")
            .await
            .unwrap()
            .expect("workshop by code");
        assert_eq!(found.id, workshop.id);

        assert!(
            Workshop::find_by_access_code(&db, "NOPE")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_access_codes_are_rejected() {
        let db = setup_db().await;

        Workshop::create(
            &db,
            &CreateWorkshop {
                title: "Eerste".to_string(),
                access_code: "DUP".to_string(),
                active: None,
            },
        )
        .await
        .unwrap();

        let err = Workshop::create(
            &db,
            &CreateWorkshop {
                title: "Tweede".to_string(),
                access_code: "DUP".to_string(),
                active: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkshopError::DuplicateAccessCode));
    }

    #[tokio::test]
    async fn set_active_toggles_flag() {
        let db = setup_db().await;

        let workshop = Workshop::create(
            &db,
            &CreateWorkshop {
                title: "Workshop".to_string(),
                access_code: "TOGGLE".to_string(),
                active: Some(true),
            },
        )
        .await
        .unwrap();

        let updated = Workshop::set_active(&db, workshop.id, false).await.unwrap();
        assert!(!updated.active);

        let err = Workshop::set_active(&db, Uuid::new_v4(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkshopError::NotFound));
    }
}

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::gallery_item;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGalleryItem {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
}

impl GalleryItem {
    fn from_model(model: gallery_item::Model) -> Self {
        Self {
            id: model.uuid,
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateGalleryItem,
    ) -> Result<Self, DbErr> {
        let active = gallery_item::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            image_url: Set(data.image_url.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = gallery_item::Entity::find()
            .filter(gallery_item::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = gallery_item::Entity::find()
            .order_by_desc(gallery_item::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = gallery_item::Entity::delete_many()
            .filter(gallery_item::Column::Uuid.eq(id))
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

    #[tokio::test]
    async fn create_list_and_delete() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();

        let item = GalleryItem::create(
            &db,
            &CreateGalleryItem {
                title: "Lichtgevend mos".to_string(),
                description: None,
                image_url: "/storage/gallery/mos.jpg".to_string(),
            },
        )
        .await
        .unwrap();

        let all = GalleryItem::find_all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, item.id);

        assert_eq!(GalleryItem::delete(&db, item.id).await.unwrap(), 1);
        assert!(GalleryItem::find_all(&db).await.unwrap().is_empty());
    }
}

use axum::{
    extract::{Multipart, Path, State},
    response::Json as ResponseJson,
};
use db::models::gallery_item::{CreateGalleryItem, GalleryItem};
use services::services::storage::BUCKET_GALLERY;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn list_gallery(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<GalleryItem>>>, ApiError> {
    let items = GalleryItem::find_all(&state.db().conn).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// Multipart form with `title`, optional `description`, and an `image`
/// file. The image lands in the gallery bucket and the item points at its
/// public URL.
pub async fn create_gallery_item(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<GalleryItem>>, ApiError> {
    let mut title = None;
    let mut description = None;
    let mut image_url = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("title") => title = Some(field.text().await?),
            Some("description") => description = Some(field.text().await?),
            Some("image") => {
                let extension = field
                    .file_name()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase())
                    .unwrap_or_else(|| "jpg".to_string());
                let bytes = field.bytes().await?;
                let key = format!("{}.{}", Uuid::new_v4(), extension);
                image_url = Some(state.store().put(BUCKET_GALLERY, &key, &bytes)?);
            }
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;
    let image_url =
        image_url.ok_or_else(|| ApiError::BadRequest("Image is required".to_string()))?;

    let item = GalleryItem::create(
        &state.db().conn,
        &CreateGalleryItem {
            title,
            description,
            image_url,
        },
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// Removes the item and its stored image. A missing object is not an error;
/// the row is authoritative.
pub async fn delete_gallery_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let item = GalleryItem::find_by_uuid(&state.db().conn, item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery item not found".to_string()))?;

    GalleryItem::delete(&state.db().conn, item_id).await?;
    if let Some(key) = item
        .image_url
        .strip_prefix(&format!("/storage/{BUCKET_GALLERY}/"))
        && let Err(err) = state.store().delete(BUCKET_GALLERY, key)
    {
        tracing::warn!("Failed to remove gallery object {key}: {err}");
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

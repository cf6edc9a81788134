use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::services::config::UploadConfig;
use crate::services::storage::{BUCKET_ORIGINAL_UPLOADS, ObjectStore, StorageError};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("HEIC/HEIF uploads cannot be decoded on this server")]
    HeicNotSupported,
    #[error("Image conversion failed: {0}")]
    Conversion(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageEncoding {
    Jpeg,
    Png,
    Heic,
    Heif,
    Webp,
    Bmp,
    Tiff,
}

impl ImageEncoding {
    fn detect(mime_type: Option<&str>, file_name: &str) -> Option<Self> {
        if let Some(encoding) = mime_type.and_then(Self::from_mime) {
            return Some(encoding);
        }
        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            "image/webp" => Some(Self::Webp),
            "image/bmp" => Some(Self::Bmp),
            "image/tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    fn passthrough(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub key: String,
    pub public_url: String,
    pub mime_type: String,
}

/// Accepts a participant photo, normalizes it to a browser-friendly
/// encoding, and writes it to the object store.
#[derive(Debug, Clone)]
pub struct UploadService {
    store: ObjectStore,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(store: ObjectStore, config: UploadConfig) -> Self {
        Self { store, config }
    }

    /// JPEG and PNG pass through byte-for-byte; WebP, BMP and TIFF are
    /// converted to JPEG, with a bounded number of retries before the
    /// upload fails. HEIC/HEIF is recognized but refused up front: there is
    /// no pure-Rust decoder for it, and the participant gets a message
    /// telling them to re-export as JPG or PNG instead of a retry loop that
    /// can never succeed.
    pub async fn store_original(
        &self,
        file_name: &str,
        mime_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        if bytes.len() > self.config.max_size_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: self.config.max_size_bytes,
            });
        }

        let encoding = ImageEncoding::detect(mime_type, file_name).ok_or_else(|| {
            UploadError::UnsupportedType(
                mime_type.map(str::to_string).unwrap_or_else(|| file_name.to_string()),
            )
        })?;
        if matches!(encoding, ImageEncoding::Heic | ImageEncoding::Heif) {
            return Err(UploadError::HeicNotSupported);
        }

        let (payload, extension, stored_mime) = if encoding.passthrough() {
            let (ext, mime) = match encoding {
                ImageEncoding::Jpeg => ("jpg", "image/jpeg"),
                _ => ("png", "image/png"),
            };
            (bytes.to_vec(), ext, mime)
        } else {
            let quality = self.config.jpeg_quality;
            let converted = (|| async { convert_to_jpeg(bytes, quality) })
                .retry(
                    ConstantBuilder::default()
                        .with_delay(Duration::from_millis(self.config.retry_delay_ms))
                        .with_max_times(self.config.conversion_retries),
                )
                .notify(|err: &UploadError, _| {
                    tracing::warn!("Image conversion attempt failed, retrying: {}", err);
                })
                .await?;
            (converted, "jpg", "image/jpeg")
        };

        let key = format!("{}.{}", Uuid::new_v4(), extension);
        let public_url = self
            .store
            .put(BUCKET_ORIGINAL_UPLOADS, &key, &payload)?;
        Ok(StoredUpload {
            key,
            public_url,
            mime_type: stored_mime.to_string(),
        })
    }
}

fn convert_to_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, UploadError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|err| UploadError::Conversion(err.to_string()))?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    decoded
        .write_with_encoder(encoder)
        .map_err(|err| UploadError::Conversion(err.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageFormat;

    use super::*;

    fn service(dir: &std::path::Path) -> UploadService {
        let store = ObjectStore::new(dir.to_path_buf()).unwrap();
        UploadService::new(
            store,
            UploadConfig {
                retry_delay_ms: 0,
                ..Default::default()
            },
        )
    }

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([120, 200, 40]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, format)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn png_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let png = encode(ImageFormat::Png);

        let stored = service
            .store_original("photo.png", Some("image/png"), &png)
            .await
            .unwrap();
        assert_eq!(stored.mime_type, "image/png");
        assert!(stored.public_url.starts_with("/storage/original_uploads/"));

        let on_disk = std::fs::read(dir.path().join("original_uploads").join(&stored.key)).unwrap();
        assert_eq!(on_disk, png);
    }

    #[tokio::test]
    async fn bmp_is_converted_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let bmp = encode(ImageFormat::Bmp);

        let stored = service
            .store_original("photo.bmp", Some("image/bmp"), &bmp)
            .await
            .unwrap();
        assert_eq!(stored.mime_type, "image/jpeg");
        assert!(stored.key.ends_with(".jpg"));

        let on_disk = std::fs::read(dir.path().join("original_uploads").join(&stored.key)).unwrap();
        assert_eq!(image::guess_format(&on_disk).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let err = service
            .store_original("photo.webp", Some("image/webp"), b"not an image")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Conversion(_)));
    }

    #[tokio::test]
    async fn heic_is_refused_before_the_conversion_path() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let err = service
            .store_original("photo.heic", Some("image/heic"), b"ftypheic")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::HeicNotSupported));

        // extension-only detection hits the same refusal
        let err = service
            .store_original("photo.heif", None, b"ftypheif")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::HeicNotSupported));

        assert!(
            std::fs::read_dir(dir.path().join("original_uploads"))
                .unwrap()
                .next()
                .is_none()
        );
    }

    #[tokio::test]
    async fn unknown_types_and_oversized_payloads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().to_path_buf()).unwrap();
        let service = UploadService::new(
            store,
            UploadConfig {
                max_size_bytes: 8,
                retry_delay_ms: 0,
                ..Default::default()
            },
        );

        let err = service
            .store_original("notes.txt", Some("text/plain"), b"abc")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));

        let err = service
            .store_original("photo.png", Some("image/png"), &[0u8; 16])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 16, max: 8 }));
    }
}

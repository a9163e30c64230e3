use crate::config::VestnikPaths;
use crate::error::{AppError, AppResult};
use anyhow::Context;
use uuid::Uuid;

/// Stored image files on disk under `images_dir`, named `{uuid}{ext}`.
/// Only JPEG and PNG payloads are accepted, sniffed from the bytes rather
/// than trusted from the upload's declared content type.
#[derive(Clone)]
pub struct MediaService {
    paths: VestnikPaths,
}

impl MediaService {
    pub fn new(paths: VestnikPaths) -> Self {
        Self { paths }
    }

    /// Persists an uploaded image and returns its generated file name.
    pub async fn store_image(&self, data: &[u8]) -> AppResult<String> {
        let ext = match infer::get(data).map(|kind| kind.mime_type()) {
            Some("image/jpeg") => ".jpg",
            Some("image/png") => ".png",
            _ => {
                return Err(AppError::Validation(
                    "unsupported image format, expected JPEG or PNG".into(),
                ))
            }
        };
        let name = format!("{}{ext}", Uuid::new_v4());
        tokio::fs::create_dir_all(&self.paths.images_dir)
            .await
            .context("creating images directory")?;
        let path = self.paths.images_dir.join(&name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("writing image {name}"))?;
        Ok(name)
    }

    /// Reads a stored image back, returning its bytes and mime type.
    /// Returns `Ok(None)` when the name is unknown or tries to escape the
    /// images directory.
    pub async fn open_image(&self, name: &str) -> AppResult<Option<(Vec<u8>, &'static str)>> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Ok(None);
        }
        let mime = if name.ends_with(".jpg") {
            "image/jpeg"
        } else if name.ends_with(".png") {
            "image/png"
        } else {
            return Ok(None);
        };
        let path = self.paths.images_dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some((bytes, mime))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(anyhow::Error::from(err)
                .context(format!("reading image {name}"))
                .into()),
        }
    }

    /// Removes a stored image once nothing references it anymore. A missing
    /// file is not an error.
    pub async fn remove_image(&self, name: &str) -> AppResult<()> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Ok(());
        }
        let path = self.paths.images_dir.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow::Error::from(err)
                .context(format!("removing image {name}"))
                .into()),
        }
    }
}

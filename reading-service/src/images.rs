use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::validation::{ImageMime, ImagePayload};

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("failed to write image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An uploaded image written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: ImageMime,
}

/// Directory holding uploaded images, served under `/static`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `payload` as `image<uuid>.<ext>`, creating the directory if
    /// needed.
    pub async fn save(&self, payload: &ImagePayload) -> Result<StoredImage, ImageError> {
        let file_name = format!("image{}.{}", Uuid::new_v4(), payload.mime.extension());
        let path = self.dir.join(&file_name);

        let write = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, &payload.bytes).await
        };
        write.await.map_err(|source| ImageError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(file = %file_name, bytes = payload.bytes.len(), "image saved");

        Ok(StoredImage {
            path,
            file_name,
            mime: payload.mime,
        })
    }

    /// Remove an image whose reading was not stored. Failures are logged
    /// and otherwise ignored; the janitor catches what is left.
    pub async fn discard(&self, image: &StoredImage) {
        match tokio::fs::remove_file(&image.path).await {
            Ok(()) => tracing::debug!(file = %image.file_name, "image discarded"),
            Err(e) => tracing::warn!(file = %image.file_name, error = %e, "failed to discard image"),
        }
    }
}

/// Public link to a stored image.
pub fn image_url(proto: &str, host: &str, file_name: &str) -> String {
    format!("{proto}://{host}/static/{file_name}")
}

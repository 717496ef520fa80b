use anyhow::{bail, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;

/// Blob store for uploaded candidate files. Keys are namespaced by the caller.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Time-limited URL through which the object can be fetched
    async fn presigned_get_url(&self, key: &str) -> Result<String>;
}

/// `companies/{company}/applications/{application}/{field}/{filename}`
pub fn application_file_key(
    company_id: i64,
    application_id: i64,
    field_id: &str,
    filename: &str,
) -> String {
    let filename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload");
    format!(
        "companies/{}/applications/{}/{}/{}",
        company_id, application_id, field_id, filename
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct DownloadClaims {
    key: String,
    exp: usize,
}

/// Local-disk object storage. Presigned URLs point back at this server's
/// `/files` route and carry a signed token binding the key and an expiry.
#[derive(Clone)]
pub struct FileStorage {
    base_path: PathBuf,
    public_url: String,
    signing_secret: String,
    expiry_secs: u64,
}

impl FileStorage {
    pub fn new(config: &StorageConfig, signing_secret: &str) -> Self {
        Self {
            base_path: PathBuf::from(&config.path),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            signing_secret: signing_secret.to_string(),
            expiry_secs: config.presign_expiry_secs,
        }
    }

    /// Resolve a key below the base directory, refusing anything that could escape it
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("invalid object key: {}", key);
        }
        Ok(self.base_path.join(relative))
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        Ok(fs::read(&path).await?)
    }

    /// Check a download token issued by `presigned_get_url` for this key
    pub fn verify_download(&self, key: &str, token: &str) -> Result<()> {
        let claims = decode::<DownloadClaims>(
            token,
            &DecodingKey::from_secret(self.signing_secret.as_bytes()),
            &Validation::default(),
        )?
        .claims;

        if claims.key != key {
            bail!("download token was issued for a different object");
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for FileStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        tracing::debug!("Stored {} ({} bytes, {})", key, bytes.len(), content_type);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        fs::remove_file(&path).await?;
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str) -> Result<String> {
        self.object_path(key)?;

        let exp = (chrono::Utc::now() + chrono::Duration::seconds(self.expiry_secs as i64))
            .timestamp() as usize;
        let token = encode(
            &Header::default(),
            &DownloadClaims {
                key: key.to_string(),
                exp,
            },
            &EncodingKey::from_secret(self.signing_secret.as_bytes()),
        )?;

        // Filenames come from candidates; keep each segment URL-safe
        let path = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(format!("{}/files/{}?token={}", self.public_url, path, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &Path) -> FileStorage {
        FileStorage::new(
            &StorageConfig {
                path: dir.to_string_lossy().to_string(),
                public_url: "https://jobs.example.com/".to_string(),
                presign_expiry_secs: 900,
            },
            "secret",
        )
    }

    #[test]
    fn test_application_file_key_strips_directories() {
        assert_eq!(
            application_file_key(3, 11, "resume", "../../etc/cv.pdf"),
            "companies/3/applications/11/resume/cv.pdf"
        );
        assert_eq!(
            application_file_key(3, 11, "resume", ""),
            "companies/3/applications/11/resume/upload"
        );
    }

    #[tokio::test]
    async fn test_upload_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());
        let key = "companies/1/applications/2/resume/cv.pdf";

        storage.upload(key, b"%PDF-1.7".to_vec(), "application/pdf").await.unwrap();
        assert_eq!(storage.read(key).await.unwrap(), b"%PDF-1.7");

        storage.delete(key).await.unwrap();
        assert!(storage.read(key).await.is_err());
        assert!(storage.delete(key).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        assert!(storage.upload("../outside", vec![1], "text/plain").await.is_err());
        assert!(storage.upload("/abs/path", vec![1], "text/plain").await.is_err());
        assert!(storage.presigned_get_url("a/../../b").await.is_err());
    }

    #[tokio::test]
    async fn test_presigned_url_token_bound_to_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());
        let key = "companies/1/applications/2/resume/cv.pdf";

        let url = storage.presigned_get_url(key).await.unwrap();
        let prefix = format!("https://jobs.example.com/files/{}?token=", key);
        assert!(url.starts_with(&prefix));

        let token = &url[prefix.len()..];
        assert!(storage.verify_download(key, token).is_ok());
        assert!(storage
            .verify_download("companies/9/applications/2/resume/cv.pdf", token)
            .is_err());
    }

    #[tokio::test]
    async fn test_presigned_url_encodes_filename() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());
        let key = application_file_key(1, 2, "resume", "cv #2?final.pdf");

        let url = storage.presigned_get_url(&key).await.unwrap();
        let prefix = "https://jobs.example.com/files/companies/1/applications/2/resume/cv%20%232%3Ffinal.pdf?token=";
        assert!(url.starts_with(prefix), "{}", url);
        assert!(storage.verify_download(&key, &url[prefix.len()..]).is_ok());
    }
}

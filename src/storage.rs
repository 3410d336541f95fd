use std::path::{Path, PathBuf};

use rand::Rng;

use crate::dto::cars::CarFields;

/// Uploaded car images on local disk, served back under a URL prefix.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{year}-{make}-{model}-{mileage}-{vin}-{random}{ext}`, restricted to URL-safe characters.
    pub fn build_file_name(&self, car: &CarFields, original_name: Option<&str>) -> String {
        let year = car.year.map(|y| y.to_string()).unwrap_or_default();
        let mileage = car.mileage.map(|m| m.to_string()).unwrap_or_default();
        let random: u32 = rand::thread_rng().gen_range(0..i32::MAX as u32);
        let stem = [
            year.as_str(),
            car.make.as_str(),
            car.model.as_str(),
            mileage.as_str(),
            car.vin.as_deref().unwrap_or(""),
        ]
        .iter()
        .map(|part| sanitize(part))
        .collect::<Vec<_>>()
        .join("-");

        format!("{stem}-{random}{}", extension(original_name))
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.url_prefix, file_name)
    }

    /// File name behind a URL this store handed out, if it is one.
    pub fn file_name_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        let safe = !name.is_empty() && !name.contains(['/', '\\']) && name != "..";
        safe.then_some(name)
    }

    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(file_name), bytes).await
    }

    /// Best-effort removal; failures are logged and otherwise ignored.
    pub async fn remove_all<I, S>(&self, file_names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in file_names {
            let path = self.dir.join(name.as_ref());
            if let Err(err) = tokio::fs::remove_file(&path).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %err, path = %path.display(), "failed to remove image");
                }
            }
        }
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn extension(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

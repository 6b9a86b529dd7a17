//! Template and font bytes for the renderer

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{CertificateError, CertificateResult};

/// Raw asset bytes handed to a render backend
#[derive(Debug, Clone)]
pub struct CertificateAssets {
    pub template: Arc<[u8]>,
    pub font: Arc<[u8]>,
}

/// Supplies certificate assets, either read fresh per request or held in memory
#[derive(Debug, Clone)]
pub struct AssetStore {
    template_path: PathBuf,
    font_path: PathBuf,
    cached: Option<CertificateAssets>,
}

impl AssetStore {
    /// Store that reads both files on every [`load`](Self::load)
    pub fn on_disk<T: Into<PathBuf>, F: Into<PathBuf>>(template_path: T, font_path: F) -> Self {
        Self {
            template_path: template_path.into(),
            font_path: font_path.into(),
            cached: None,
        }
    }

    /// Store that reads both files once, now
    pub async fn preloaded<T: Into<PathBuf>, F: Into<PathBuf>>(
        template_path: T,
        font_path: F,
    ) -> CertificateResult<Self> {
        let mut store = Self::on_disk(template_path, font_path);
        let assets = read_assets(&store.template_path, &store.font_path).await?;
        info!(
            template_bytes = assets.template.len(),
            font_bytes = assets.font.len(),
            "Certificate assets cached in memory"
        );
        store.cached = Some(assets);
        Ok(store)
    }

    /// Store around assets already in memory
    pub fn from_bytes<T: Into<Arc<[u8]>>, F: Into<Arc<[u8]>>>(template: T, font: F) -> Self {
        Self {
            template_path: PathBuf::new(),
            font_path: PathBuf::new(),
            cached: Some(CertificateAssets {
                template: template.into(),
                font: font.into(),
            }),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    pub async fn load(&self) -> CertificateResult<CertificateAssets> {
        match &self.cached {
            Some(assets) => Ok(assets.clone()),
            None => read_assets(&self.template_path, &self.font_path).await,
        }
    }
}

/// Read template and font concurrently
async fn read_assets(
    template_path: &Path,
    font_path: &Path,
) -> CertificateResult<CertificateAssets> {
    let (template, font) = tokio::try_join!(
        read_asset("template", template_path),
        read_asset("font", font_path)
    )?;
    debug!(
        template = %template_path.display(),
        font = %font_path.display(),
        "Read certificate assets"
    );
    Ok(CertificateAssets { template, font })
}

async fn read_asset(asset: &str, path: &Path) -> CertificateResult<Arc<[u8]>> {
    tokio::fs::read(path)
        .await
        .map(Arc::from)
        .map_err(|e| CertificateError::template(asset, format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_on_disk_reads_every_time() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.pdf");
        let font = dir.path().join("font.ttf");
        std::fs::write(&template, b"template-v1").unwrap();
        std::fs::write(&font, b"font").unwrap();

        let store = AssetStore::on_disk(&template, &font);
        assert_eq!(&*store.load().await.unwrap().template, b"template-v1");

        std::fs::write(&template, b"template-v2").unwrap();
        assert_eq!(&*store.load().await.unwrap().template, b"template-v2");
    }

    #[tokio::test]
    async fn test_preloaded_keeps_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.pdf");
        let font = dir.path().join("font.ttf");
        std::fs::write(&template, b"template-v1").unwrap();
        std::fs::write(&font, b"font").unwrap();

        let store = AssetStore::preloaded(&template, &font).await.unwrap();
        std::fs::remove_file(&template).unwrap();

        assert!(store.is_cached());
        assert_eq!(&*store.load().await.unwrap().template, b"template-v1");
    }

    #[tokio::test]
    async fn test_missing_font_is_a_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.pdf");
        std::fs::write(&template, b"template").unwrap();

        let store = AssetStore::on_disk(&template, dir.path().join("missing.ttf"));
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CertificateError::Template { ref asset, .. } if asset == "font"));
    }
}

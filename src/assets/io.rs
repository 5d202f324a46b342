use std::path::{Path, PathBuf};

/// Async byte reader for asset sources.
pub trait AssetReader: Send + Sync {
    fn read_bytes(
        &self,
        uri: &str,
    ) -> impl std::future::Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

/// Local filesystem reader rooted at a directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        let data = tokio::fs::read(&path).await?;
        Ok(data)
    }
}

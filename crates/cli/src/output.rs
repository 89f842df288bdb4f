use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use buildcast_core::GeneratedImage;
use tracing::debug;

/// `building-stage-{n}.{ext}`, with `n` 1-based.
pub fn stage_file_name(stage_number: usize, image: &GeneratedImage) -> String {
    format!("building-stage-{}.{}", stage_number, image.file_extension())
}

/// Decode every data URI and write it to `dir`, in stage order.
pub async fn write_images(dir: &Path, data_uris: &[String]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(data_uris.len());
    for (index, uri) in data_uris.iter().enumerate() {
        let stage_number = index + 1;
        let image = GeneratedImage::from_data_uri(uri)
            .with_context(|| format!("Stage {} returned an unreadable image", stage_number))?;
        let bytes = image
            .decode()
            .with_context(|| format!("Stage {} image is not valid base64", stage_number))?;

        let path = dir.join(stage_file_name(stage_number, &image));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Wrote stage image");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stage_file_name() {
        let jpeg = GeneratedImage::new("image/jpeg", "");
        assert_eq!(stage_file_name(1, &jpeg), "building-stage-1.jpeg");

        let png = GeneratedImage::new("image/png", "");
        assert_eq!(stage_file_name(10, &png), "building-stage-10.png");
    }

    #[tokio::test]
    async fn test_write_images() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let uris = vec![
            "data:image/jpeg;base64,Zmlyc3Q=".to_string(),
            "data:image/png;base64,c2Vjb25k".to_string(),
        ];

        let paths = write_images(&out, &uris).await.unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("building-stage-1.jpeg"));
        assert!(paths[1].ends_with("building-stage-2.png"));
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"first");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_rejects_bad_uri() {
        let dir = TempDir::new().unwrap();
        let uris = vec!["https://example.com/a.jpg".to_string()];

        let err = write_images(dir.path(), &uris).await.unwrap_err();
        assert!(err.to_string().contains("Stage 1"));
    }
}

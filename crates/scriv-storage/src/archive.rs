//! Gzip archival of finished log files

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::StorageError;
use crate::naming::COMPRESSED_EXT;

/// Sibling path of `path` with the compressed extension appended
pub fn archive_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(COMPRESSED_EXT);
    PathBuf::from(name)
}

fn compress_blocking(src: &Path, dst: &Path) -> Result<u64, StorageError> {
    let input = File::open(src)?;
    let output = File::create(dst)?;

    let mut reader = BufReader::new(input);
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    let copied = std::io::copy(&mut reader, &mut encoder)
        .map_err(|e| StorageError::compression(e.to_string()))?;
    let mut writer = encoder
        .finish()
        .map_err(|e| StorageError::compression(e.to_string()))?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(copied)
}

/// Compress `src` into `dst` on the blocking pool.
///
/// The source is left untouched. On failure any partial `dst` is removed.
/// Returns the number of uncompressed bytes read.
pub async fn gzip_file(src: &Path, dst: &Path) -> Result<u64, StorageError> {
    let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
    tokio::task::spawn_blocking(move || {
        let result = compress_blocking(&src, &dst);
        if result.is_err() {
            let _ = std::fs::remove_file(&dst);
        }
        result
    })
    .await
    .map_err(|e| StorageError::compression(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_archive_path() {
        assert_eq!(
            archive_path(Path::new("logs/app-(1)-a-b.log")),
            PathBuf::from("logs/app-(1)-a-b.log.gz")
        );
    }

    #[tokio::test]
    async fn test_gzip_roundtrip() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("app.log");
        std::fs::write(&src, b"line one\nline two\n").unwrap();
        let dst = archive_path(&src);

        let read = gzip_file(&src, &dst).await.unwrap();
        assert_eq!(read, 18);
        assert!(src.exists());

        let mut text = String::new();
        GzDecoder::new(File::open(&dst).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_missing_source_leaves_no_artifact() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("gone.log");
        let dst = archive_path(&src);

        assert!(gzip_file(&src, &dst).await.is_err());
        assert!(!dst.exists());
    }
}

//! Screen captures
//!
//! Screens painted by valid transactions are dumped as plain text, one file
//! per transaction ID, so they can be reviewed after the scan.

use std::path::{Path, PathBuf};

use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to create capture directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write capture {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `<dir>/<ID>.txt`, with characters that would escape `dir` replaced
pub fn capture_path(dir: &Path, identifier: &str) -> PathBuf {
    let name: String = identifier
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            '.' if identifier.chars().all(|c| c == '.') => '_',
            c => c,
        })
        .collect();
    dir.join(format!("{}.txt", name))
}

/// Write the raw screen text for `identifier` under `dir`
pub async fn save_screen(dir: &Path, identifier: &str, screen: &str) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|source| CaptureError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = capture_path(dir, identifier);
    fs::write(&path, screen.as_bytes())
        .await
        .map_err(|source| CaptureError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_capture_path_is_uppercase() {
        let path = capture_path(Path::new("/tmp/out"), "cemt");
        assert_eq!(path, PathBuf::from("/tmp/out/CEMT.txt"));
    }

    #[test]
    fn test_capture_path_stays_in_dir() {
        let dir = Path::new("/tmp/out");
        assert_eq!(capture_path(dir, "a/b"), dir.join("A_B.txt"));
        assert_eq!(capture_path(dir, ".."), dir.join("__.txt"));
        assert_eq!(capture_path(dir, "A.B"), dir.join("A.B.txt"));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let temp = tempdir().unwrap();
        let screen = "DFHCE3520 Please type your userid.\n  Userid . . . .  \u{a2}\n";

        let path = save_screen(temp.path(), "cesn", screen).await.unwrap();
        assert_eq!(path, temp.path().join("CESN.txt"));

        let read_back = tokio::fs::read(&path).await.unwrap();
        assert_eq!(read_back, screen.as_bytes());
    }

    #[tokio::test]
    async fn test_creates_missing_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("captures").join("run1");

        save_screen(&dir, "CEMT", "x").await.unwrap();
        assert!(dir.join("CEMT.txt").exists());
    }
}

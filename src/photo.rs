//! 梱包写真ファイルの選択
//!
//! 撮影フォルダ直下の画像から最新のものを選ぶ。パス指定時は拡張子を検証する。

use crate::error::{FastPackError, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// アップロード対象として使える写真か検証
pub fn validate_photo(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(FastPackError::FileNotFound(path.display().to_string()));
    }
    if !has_image_extension(path) {
        return Err(FastPackError::InvalidPhoto(format!(
            "{} (対応形式: {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )));
    }
    Ok(path.to_path_buf())
}

/// フォルダ直下で更新日時が最も新しい画像
pub fn latest_photo(folder: &Path) -> Result<Option<PathBuf>> {
    if !folder.is_dir() {
        return Err(FastPackError::FileNotFound(folder.display().to_string()));
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !has_image_extension(path) {
            continue;
        }

        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let newer = match &latest {
            Some((time, current)) => {
                modified > *time || (modified == *time && path > current.as_path())
            }
            None => true,
        };
        if newer {
            latest = Some((modified, path.to_path_buf()));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("png"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
    }

    #[test]
    fn test_validate_photo() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("box.jpg");
        let note = dir.path().join("note.txt");
        fs::write(&photo, b"dummy").unwrap();
        fs::write(&note, b"text").unwrap();

        assert_eq!(validate_photo(&photo).unwrap(), photo);
        assert!(matches!(validate_photo(&note), Err(FastPackError::InvalidPhoto(_))));
        assert!(matches!(
            validate_photo(&dir.path().join("missing.jpg")),
            Err(FastPackError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_latest_photo_folder_not_found() {
        assert!(latest_photo(Path::new("/nonexistent/folder")).is_err());
    }

    #[test]
    fn test_latest_photo_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), b"text").unwrap();
        assert!(latest_photo(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_latest_photo_by_modified_time() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("a.jpg");
        let new = dir.path().join("b.png");
        File::create(&old).unwrap();
        File::create(&new).unwrap();

        let base = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(base)
            .unwrap();
        File::options()
            .write(true)
            .open(&new)
            .unwrap()
            .set_modified(base + Duration::from_secs(60))
            .unwrap();

        assert_eq!(latest_photo(dir.path()).unwrap(), Some(new));
    }

    #[test]
    fn test_latest_photo_ignores_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("old");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("c.jpg"), b"dummy").unwrap();
        fs::write(dir.path().join("a.jpg"), b"dummy").unwrap();

        assert_eq!(latest_photo(dir.path()).unwrap(), Some(dir.path().join("a.jpg")));
    }
}

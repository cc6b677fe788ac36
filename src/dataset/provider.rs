use std::path::{Path, PathBuf};

use crate::error::{Result, SrError};

/// File extensions recognised as dataset images.
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "tif"];

/// Enumerates the images of a dataset directory.
pub trait DatasetProvider {
    /// Image files in `dir`, in a stable order.
    ///
    /// Fails with `DirectoryNotFound` if `dir` does not exist.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Lists image files of a directory on disk, sorted by file name.
/// Subdirectories and non-image files are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDatasetProvider;

impl DatasetProvider for FsDatasetProvider {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(SrError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        files.sort();
        Ok(files)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_only_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.bmp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = FsDatasetProvider.list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.bmp"]);
    }

    #[test]
    fn test_missing_directory() {
        let err = FsDatasetProvider.list_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SrError::DirectoryNotFound(_)));
    }
}

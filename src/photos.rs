//! Photo documentation intake.
//!
//! A bounded, ordered collection of user-supplied photos. A batch that would
//! exceed the limit is rejected as a whole; an unsupported file inside an
//! otherwise valid batch is rejected alone and its siblings still load.

use crate::error::{ProtokolError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};
use indicatif::ProgressBar;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use walkdir::WalkDir;

pub const MAX_PHOTOS: usize = 8;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

#[derive(Debug, Clone)]
pub struct Photo {
    pub id: String,
    pub data: Vec<u8>,
    pub display_url: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub captured_at: String,
}

/// Per-file rejection inside a batch. Does not abort sibling files.
#[derive(Debug)]
pub struct IntakeRejection {
    pub file_name: String,
    pub error: ProtokolError,
}

#[derive(Debug, Default)]
pub struct PhotoCollection {
    photos: Vec<Photo>,
}

impl PhotoCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// The photos-only document is available only when photos exist.
    /// Re-checked after every add/remove.
    pub fn can_export(&self) -> bool {
        !self.photos.is_empty()
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn clear(&mut self) {
        self.photos.clear();
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.photos.len();
        self.photos.retain(|p| p.id != id);
        self.photos.len() != before
    }

    /// Load a batch of files, preserving selection order.
    ///
    /// The whole batch is rejected when it would push the collection over
    /// [`MAX_PHOTOS`]. Individual files that are not images or cannot be read
    /// are returned as rejections while the rest of the batch continues.
    /// Flipping `cancel` to true stops the intake between files.
    pub async fn add_batch(
        &mut self,
        paths: &[PathBuf],
        cancel: &watch::Receiver<bool>,
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<IntakeRejection>> {
        if self.photos.len() + paths.len() > MAX_PHOTOS {
            return Err(ProtokolError::TooManyPhotos {
                limit: MAX_PHOTOS,
                existing: self.photos.len(),
                incoming: paths.len(),
            });
        }

        let mut rejections = Vec::new();

        for path in paths {
            if *cancel.borrow() {
                break;
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let Some(mime_type) = mime_for_path(path) else {
                rejections.push(IntakeRejection {
                    file_name: file_name.clone(),
                    error: ProtokolError::NotAnImage(file_name),
                });
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                continue;
            };

            match tokio::fs::read(path).await {
                Ok(data) => {
                    let photo = self.build_photo(path, file_name, mime_type, data);
                    self.photos.push(photo);
                }
                Err(e) => rejections.push(IntakeRejection {
                    file_name,
                    error: ProtokolError::Io(e),
                }),
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        Ok(rejections)
    }

    fn build_photo(
        &self,
        path: &Path,
        file_name: String,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Photo {
        let size_bytes = data.len() as u64;
        let display_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(&data));
        let captured_at = captured_at(path, &data);

        let mut id = photo_id(&file_name, &data);
        if self.photos.iter().any(|p| p.id == id) {
            // Same file added twice; keep ids unique by ordinal.
            id = format!("{}-{}", id, self.photos.len());
        }

        Photo {
            id,
            data,
            display_url,
            file_name,
            size_bytes,
            mime_type: mime_type.to_string(),
            captured_at,
        }
    }
}

fn photo_id(file_name: &str, data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_name.as_bytes());
    hasher.update(data);
    let digest = hex::encode(hasher.finalize());
    format!("photo-{}", &digest[..9])
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Capture timestamp: EXIF when present, file mtime otherwise, now as a
/// last resort.
fn captured_at(path: &Path, data: &[u8]) -> String {
    if let Some(date) = exif_date(data) {
        return date;
    }

    if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
        let local: DateTime<Local> = modified.into();
        return local.format("%Y-%m-%d %H:%M").to_string();
    }

    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

fn exif_date(data: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(data);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;

    for tag in [exif::Tag::DateTimeOriginal, exif::Tag::DateTime] {
        if let Some(field) = exif.get_field(tag, exif::In::PRIMARY) {
            return Some(field.display_value().to_string());
        }
    }

    None
}

/// Collect image files directly inside `folder`, ordered by file name.
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(ProtokolError::FolderNotFound(folder.display().to_string()));
    }

    let mut paths = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && mime_for_path(path).is_some() {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn no_cancel() -> watch::Receiver<bool> {
        // A dropped sender keeps the last value readable.
        let (_tx, rx) = watch::channel(false);
        rx
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_batch_over_limit_rejected_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = PhotoCollection::new();

        let first: Vec<_> = (0..6)
            .map(|i| write_file(dir.path(), &format!("a{}.jpg", i), b"img"))
            .collect();
        collection
            .add_batch(&first, &no_cancel(), None)
            .await
            .unwrap();
        assert_eq!(collection.len(), 6);

        let second: Vec<_> = (0..3)
            .map(|i| write_file(dir.path(), &format!("b{}.jpg", i), b"img"))
            .collect();
        let err = collection
            .add_batch(&second, &no_cancel(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProtokolError::TooManyPhotos {
                limit: 8,
                existing: 6,
                incoming: 3,
            }
        ));
        // Existing collection untouched.
        assert_eq!(collection.len(), 6);
    }

    #[tokio::test]
    async fn test_non_image_rejected_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = PhotoCollection::new();

        let paths = vec![
            write_file(dir.path(), "one.jpg", b"img-1"),
            write_file(dir.path(), "notes.txt", b"text"),
            write_file(dir.path(), "two.png", b"img-2"),
        ];

        let rejections = collection
            .add_batch(&paths, &no_cancel(), None)
            .await
            .unwrap();

        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].file_name, "notes.txt");
        assert!(matches!(rejections[0].error, ProtokolError::NotAnImage(_)));

        // Siblings landed, in selection order.
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.photos()[0].file_name, "one.jpg");
        assert_eq!(collection.photos()[1].file_name, "two.png");
        assert_eq!(collection.photos()[1].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_photo_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = PhotoCollection::new();
        let paths = vec![write_file(dir.path(), "site.jpg", b"payload")];

        collection
            .add_batch(&paths, &no_cancel(), None)
            .await
            .unwrap();

        let photo = &collection.photos()[0];
        assert!(photo.id.starts_with("photo-"));
        assert_eq!(photo.size_bytes, 7);
        assert!(photo.display_url.starts_with("data:image/jpeg;base64,"));
        assert!(!photo.captured_at.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_file_gets_distinct_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = PhotoCollection::new();
        let path = write_file(dir.path(), "dup.jpg", b"same");

        collection
            .add_batch(&[path.clone(), path], &no_cancel(), None)
            .await
            .unwrap();

        assert_eq!(collection.len(), 2);
        assert_ne!(collection.photos()[0].id, collection.photos()[1].id);
    }

    #[tokio::test]
    async fn test_remove_and_export_gate() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = PhotoCollection::new();
        assert!(!collection.can_export());

        let paths = vec![write_file(dir.path(), "x.jpg", b"img")];
        collection
            .add_batch(&paths, &no_cancel(), None)
            .await
            .unwrap();
        assert!(collection.can_export());

        let id = collection.photos()[0].id.clone();
        assert!(collection.remove(&id));
        assert!(!collection.remove(&id));
        assert!(!collection.can_export());
    }

    #[tokio::test]
    async fn test_cancellation_stops_intake() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = PhotoCollection::new();
        let paths = vec![
            write_file(dir.path(), "a.jpg", b"img"),
            write_file(dir.path(), "b.jpg", b"img"),
        ];

        let (tx, rx) = watch::channel(true);
        let rejections = collection.add_batch(&paths, &rx, None).await.unwrap();
        drop(tx);

        assert!(rejections.is_empty());
        assert_eq!(collection.len(), 0);
    }

    #[test]
    fn test_scan_folder_orders_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "c.jpg", b"1");
        write_file(dir.path(), "a.png", b"2");
        write_file(dir.path(), "b.txt", b"3");

        let paths = scan_folder(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "c.jpg"]);
    }

    #[test]
    fn test_scan_folder_missing() {
        assert!(scan_folder(Path::new("/neexistuje/slozka")).is_err());
    }
}

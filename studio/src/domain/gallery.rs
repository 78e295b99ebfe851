//! Images selected for an edit
//!
//! The gallery only tracks paths; file contents are read when the planning
//! session is started.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Extensions accepted as images
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "heic"];

/// Errors from gallery edits
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("Not an image file: {0}")]
    NotAnImage(PathBuf),
}

/// An image queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub id: String,
    pub path: PathBuf,
}

impl UploadedImage {
    /// File name for display and for the multipart upload
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Ordered collection of images; order is the image index used by the plan
#[derive(Debug, Clone, Default)]
pub struct ImageGallery {
    images: Vec<UploadedImage>,
}

impl ImageGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image, rejecting files without an image extension
    pub fn add(&mut self, path: impl Into<PathBuf>) -> Result<&UploadedImage, GalleryError> {
        let path = path.into();
        debug!(?path, "ImageGallery::add: called");
        if !is_image(&path) {
            debug!(?path, "ImageGallery::add: rejected, not an image");
            return Err(GalleryError::NotAnImage(path));
        }
        let image = UploadedImage {
            id: format!("img-{}", Uuid::now_v7()),
            path,
        };
        self.images.push(image);
        Ok(&self.images[self.images.len() - 1])
    }

    /// Remove an image by id; returns whether it was present
    pub fn remove(&mut self, id: &str) -> bool {
        debug!(%id, "ImageGallery::remove: called");
        let before = self.images.len();
        self.images.retain(|img| img.id != id);
        self.images.len() != before
    }

    /// Remove the most recently added image
    pub fn pop(&mut self) -> Option<UploadedImage> {
        self.images.pop()
    }

    pub fn clear(&mut self) {
        debug!(count = self.images.len(), "ImageGallery::clear: called");
        self.images.clear();
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    /// Paths in upload order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|img| img.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut gallery = ImageGallery::new();
        let id = gallery.add("a.jpg").unwrap().id.clone();
        gallery.add("b.PNG").unwrap();
        assert_eq!(gallery.len(), 2);

        assert!(gallery.remove(&id));
        assert!(!gallery.remove(&id));
        assert_eq!(gallery.paths(), vec![PathBuf::from("b.PNG")]);
    }

    #[test]
    fn test_rejects_non_images() {
        let mut gallery = ImageGallery::new();
        assert_eq!(
            gallery.add("notes.txt").unwrap_err(),
            GalleryError::NotAnImage(PathBuf::from("notes.txt"))
        );
        assert!(gallery.add("no_extension").is_err());
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut gallery = ImageGallery::new();
        let a = gallery.add("a.jpg").unwrap().id.clone();
        let b = gallery.add("a.jpg").unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_name() {
        let mut gallery = ImageGallery::new();
        let img = gallery.add("/tmp/shots/beach.webp").unwrap();
        assert_eq!(img.file_name(), "beach.webp");
    }
}

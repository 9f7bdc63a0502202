//! Background image catalog.
//!
//! The production [`BackgroundImageProvider`]: picks uniformly from a
//! non-empty list of images, either the bundled set or one loaded from a JSON
//! file (an array of `{name, source, author, link}` objects).

use crate::environment::BackgroundImageProvider;
use crate::state::BackgroundImage;
use rand::seq::SliceRandom;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be read
    #[error("Failed to read background catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not a JSON array of images
    #[error("Invalid background catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A catalog must hold at least one image
    #[error("Background catalog is empty")]
    Empty,
}

/// Uniform random choice over a fixed list of images.
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    images: Vec<BackgroundImage>,
}

impl ImageCatalog {
    /// Build a catalog from `images`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] if `images` is empty.
    pub fn new(images: Vec<BackgroundImage>) -> Result<Self, CatalogError> {
        if images.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { images })
    }

    /// The images shipped with the page
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            images: bundled_images(),
        }
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read, does not parse, or
    /// lists no images.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let images: Vec<BackgroundImage> = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.as_ref().display(), count = images.len(), "Loaded background catalog");
        Self::new(images)
    }

    /// Number of images
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// A catalog is never empty once built
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The images, in catalog order
    #[must_use]
    pub fn images(&self) -> &[BackgroundImage] {
        &self.images
    }
}

impl BackgroundImageProvider for ImageCatalog {
    fn random_background_image(&self) -> BackgroundImage {
        self.images
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(fallback_image)
    }
}

fn image(name: &str, source: &str, author: &str, link: &str) -> BackgroundImage {
    BackgroundImage {
        name: name.to_string(),
        source: source.to_string(),
        author: author.to_string(),
        link: link.to_string(),
    }
}

fn fallback_image() -> BackgroundImage {
    image(
        "Mountain lake",
        "backgrounds/mountain-lake.webp",
        "Open Photo Collective",
        "https://example.org/photographers/open-photo-collective",
    )
}

fn bundled_images() -> Vec<BackgroundImage> {
    vec![
        fallback_image(),
        image(
            "Desert dunes",
            "backgrounds/desert-dunes.webp",
            "Open Photo Collective",
            "https://example.org/photographers/open-photo-collective",
        ),
        image(
            "Coastal fog",
            "backgrounds/coastal-fog.webp",
            "Field Notes Studio",
            "https://example.org/photographers/field-notes-studio",
        ),
        image(
            "Autumn forest",
            "backgrounds/autumn-forest.webp",
            "Field Notes Studio",
            "https://example.org/photographers/field-notes-studio",
        ),
    ]
}

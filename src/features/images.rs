//! Image resolution and `\includegraphics` options
//!
//! The key abstraction is the `ImageResolver` trait which turns an `<img src>` value
//! (relative path, `file:` URL, remote URL or `data:` URI) into a local path that
//! LaTeX can include. Resolution is synchronous; images fetched ahead of time by a
//! download pass are handed in through `MemoryImageResolver`.

use std::collections::HashMap;

#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

use url::Url;

use super::units::Dimension;
use crate::utils::error::{ConversionError, ConversionResult};

/// What an `src` attribute points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Relative or absolute filesystem path
    Path(String),
    /// `file:` URL, already converted to a path
    FileUrl(String),
    /// `http:`/`https:` and other fetchable URLs
    Remote(String),
    /// Inline `data:` URI
    Embedded,
}

impl ImageSource {
    pub fn classify(src: &str) -> ImageSource {
        let src = src.trim();
        match Url::parse(src) {
            Ok(url) => match url.scheme() {
                "data" => ImageSource::Embedded,
                "file" => ImageSource::FileUrl(url.path().to_string()),
                // single-letter schemes are Windows drive letters ("C:\img.png")
                s if s.len() == 1 => ImageSource::Path(src.to_string()),
                _ => ImageSource::Remote(src.to_string()),
            },
            Err(_) => ImageSource::Path(src.to_string()),
        }
    }
}

/// Trait for resolving image sources to local paths
///
/// Implementations:
/// - `StdImageResolver`: checks the filesystem (CLI)
/// - `MemoryImageResolver`: pre-populated mapping (downloaded images, tests)
/// - `PassthroughImageResolver`: trusts local paths without checking them (default)
pub trait ImageResolver {
    /// Resolve an `src` value to a path usable in `\includegraphics`
    fn resolve(&self, src: &str) -> ConversionResult<String>;
}

/// Accepts local paths as they are; remote and embedded images are errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughImageResolver;

impl ImageResolver for PassthroughImageResolver {
    fn resolve(&self, src: &str) -> ConversionResult<String> {
        match ImageSource::classify(src) {
            ImageSource::Path(p) | ImageSource::FileUrl(p) if !p.is_empty() => Ok(p),
            ImageSource::Path(_) | ImageSource::FileUrl(_) => {
                Err(ConversionError::image("empty image source"))
            }
            ImageSource::Remote(url) => Err(ConversionError::image(format!(
                "remote image '{}' was not downloaded",
                url
            ))),
            ImageSource::Embedded => Err(ConversionError::unsupported(
                "embedded data: image without a decoded file",
            )),
        }
    }
}

/// Memory-based image resolver (for images fetched ahead of the conversion)
pub struct MemoryImageResolver {
    images: HashMap<String, String>,
    /// Resolve unmapped local paths as-is
    fallback_to_path: bool,
}

impl MemoryImageResolver {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            fallback_to_path: false,
        }
    }

    /// Unmapped local paths resolve to themselves
    pub fn with_path_fallback() -> Self {
        Self {
            images: HashMap::new(),
            fallback_to_path: true,
        }
    }

    /// Register the local file for an `src` value
    pub fn add_image(&mut self, src: &str, local_path: &str) {
        self.images.insert(src.trim().to_string(), local_path.to_string());
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Default for MemoryImageResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageResolver for MemoryImageResolver {
    fn resolve(&self, src: &str) -> ConversionResult<String> {
        if let Some(path) = self.images.get(src.trim()) {
            return Ok(path.clone());
        }
        if self.fallback_to_path {
            return PassthroughImageResolver.resolve(src);
        }
        Err(ConversionError::image(format!("no image registered for '{}'", src)))
    }
}

/// Standard filesystem resolver (for CLI usage)
#[cfg(not(target_arch = "wasm32"))]
pub struct StdImageResolver {
    base_directory: Option<PathBuf>,
    /// Extra directories searched for relative paths
    search_paths: Vec<PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
impl StdImageResolver {
    pub fn new() -> Self {
        Self {
            base_directory: None,
            search_paths: vec![],
        }
    }

    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_directory: Some(base_dir.as_ref().to_path_buf()),
            search_paths: vec![base_dir.as_ref().to_path_buf()],
        }
    }

    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_directory.as_deref()
    }

    /// Try to find a file in search paths
    fn find_file(&self, filename: &str) -> Option<PathBuf> {
        let path = Path::new(filename);
        if path.is_absolute() {
            return path.exists().then(|| path.to_path_buf());
        }

        for search_path in &self.search_paths {
            let full_path = search_path.join(filename);
            if full_path.exists() {
                return Some(full_path);
            }
        }

        path.exists().then(|| path.to_path_buf())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for StdImageResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ImageResolver for StdImageResolver {
    fn resolve(&self, src: &str) -> ConversionResult<String> {
        let path = PassthroughImageResolver.resolve(src)?;
        self.find_file(&path)
            .map(|p| p.to_string_lossy().to_string())
            .ok_or_else(|| ConversionError::image(format!("image file not found: {}", path)))
    }
}

/// Size options for `\includegraphics`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageOptions {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    /// Width relative to `\linewidth`, used for image grid cells
    pub line_fraction: Option<f64>,
}

impl ImageOptions {
    /// Convert to LaTeX includegraphics options (without brackets)
    pub fn to_latex_options(&self) -> String {
        let mut opts = Vec::new();

        if let Some(frac) = self.line_fraction {
            opts.push(format!("width={}\\linewidth", super::units::format_num(frac)));
        } else if let Some(ref w) = self.width {
            if let Ok(w) = w.to_latex() {
                opts.push(format!("width={}", w));
            }
        }
        if let Some(ref h) = self.height {
            if let Ok(h) = h.to_latex() {
                opts.push(format!("height={}", h));
            }
        }
        if opts.len() == 2 {
            opts.push("keepaspectratio".to_string());
        }

        opts.join(",")
    }
}

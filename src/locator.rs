//! Content locators and their resolution to names and byte streams.
//!
//! A [`ContentLocator`] is the opaque reference handed back by a file
//! picker. The runtime never treats it as a path directly; everything
//! goes through a [`ContentSource`], so tests and future platform
//! backends can substitute their own resolution.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Opaque reference to user-selected content.
///
/// On the desktop this wraps whatever string the picker printed
/// (a file-system path for zenity/kdialog), but consumers only ever
/// pass it back to a [`ContentSource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentLocator(String);

impl ContentLocator {
    /// Wrap a raw locator string as returned by a picker.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw locator text, for logging and resolution.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Path> for ContentLocator {
    fn from(p: &Path) -> Self {
        Self(p.display().to_string())
    }
}

/// Resolution of locators into display names and readable byte streams.
///
/// Mirrors the two-step contract of platform content resolvers: querying
/// the display name is separate from opening the stream, so the
/// extension check can reject a candidate without touching its bytes.
pub trait ContentSource: Send + Sync {
    /// Resolve the locator to a human-readable display name.
    ///
    /// Returns `None` when the locator cannot be resolved at all, which
    /// the import pipeline reports as a plain failure without any
    /// format check.
    fn display_name(&self, locator: &ContentLocator) -> Option<String>;

    /// Open the locator's content for reading.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the stream cannot be
    /// opened; the pipeline fails the whole import in that case and
    /// leaves the destination untouched.
    fn open(&self, locator: &ContentLocator) -> std::io::Result<Box<dyn Read + Send>>;
}

/// File-system backed [`ContentSource`] used by the desktop binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsContentSource;

impl ContentSource for FsContentSource {
    fn display_name(&self, locator: &ContentLocator) -> Option<String> {
        let path = PathBuf::from(locator.as_str());
        if !path.exists() {
            return None;
        }
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    fn open(&self, locator: &ContentLocator) -> std::io::Result<Box<dyn Read + Send>> {
        let file = File::open(locator.as_str())?;
        Ok(Box::new(file))
    }
}

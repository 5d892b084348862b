//! Geo database import pipeline.
//!
//! Validates a picked file's extension against the engine's whitelist,
//! then copies its bytes into the engine's private `clash` directory
//! under a deterministic, category-derived name. The copy is atomic:
//! bytes land in a temp file inside the destination directory and are
//! renamed over the final name only on success, so a failed or
//! interrupted import never leaves a corrupt database visible.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Error;
use crate::locator::{ContentLocator, ContentSource};

/// Extensions the proxy engine accepts for geo database files.
pub const VALID_DATABASE_EXTENSIONS: [&str; 4] = [".metadb", ".db", ".dat", ".mmdb"];

/// Geo database category being imported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// GeoIP address database.
    GeoIp,
    /// GeoSite domain database.
    GeoSite,
    /// Country lookup database.
    Country,
}

impl ImportKind {
    /// Destination file stem for this category. The mapping is the
    /// single place category names are spelled out.
    #[must_use]
    pub const fn destination_stem(self) -> &'static str {
        match self {
            Self::GeoIp => "geoip",
            Self::GeoSite => "geosite",
            Self::Country => "country",
        }
    }

    /// Human-readable label for logs and UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GeoIp => "GeoIP",
            Self::GeoSite => "GeoSite",
            Self::Country => "Country",
        }
    }
}

/// Result of one import attempt, consumed by the feedback layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Bytes were copied; carries the candidate's display name for the
    /// success notice.
    Succeeded {
        /// Display name of the imported file.
        display_name: String,
    },
    /// Extension not whitelisted; nothing was written.
    Rejected {
        /// Joined list of accepted extensions.
        hint: String,
    },
    /// Locator missing, unresolvable, or the copy itself failed.
    Failed,
}

/// Derive the extension from a display name: everything after the last
/// `.`, prefixed with `.`.
///
/// A name without any dot yields the degenerate `"."`, which can never
/// match the whitelist. That is deliberate rejection, not an error.
#[must_use]
pub fn derived_extension(display_name: &str) -> String {
    display_name
        .rsplit_once('.')
        .map_or_else(|| ".".to_string(), |(_, ext)| format!(".{ext}"))
}

/// Deterministic destination file name for a category and extension,
/// e.g. `geoip.mmdb`.
#[must_use]
pub fn destination_file_name(kind: ImportKind, ext: &str) -> String {
    format!("{}{}", kind.destination_stem(), ext)
}

/// Joined whitelist for rejection notices, e.g. `.metadb/.db/.dat/.mmdb`.
#[must_use]
pub fn extensions_hint() -> String {
    VALID_DATABASE_EXTENSIONS.join("/")
}

/// Run the full import pipeline for one picked candidate.
///
/// Inputs:
/// - `source`: content resolution collaborator
/// - `locator`: picked content, `None` when the user cancelled the picker
/// - `kind`: geo database category determining the destination name
/// - `clash_dir`: the engine's private geo database directory
///
/// Output: an [`ImportOutcome`] for the feedback layer. All failure
/// modes are folded into the outcome; this function never errors.
///
/// Details:
/// - No extension check happens when resolution fails (per the resolver
///   contract, an unresolvable candidate is just a failed import).
/// - The blocking byte copy runs under `spawn_blocking` so the dispatch
///   loop stays responsive while large databases are written.
pub async fn import_geo_file(
    source: Arc<dyn ContentSource>,
    locator: Option<ContentLocator>,
    kind: ImportKind,
    clash_dir: PathBuf,
) -> ImportOutcome {
    let Some(locator) = locator else {
        tracing::info!(kind = kind.label(), "import cancelled by user");
        return ImportOutcome::Failed;
    };

    let Some(display_name) = source.display_name(&locator) else {
        tracing::warn!(kind = kind.label(), locator = locator.as_str(), "candidate did not resolve");
        return ImportOutcome::Failed;
    };

    let ext = derived_extension(&display_name);
    if !VALID_DATABASE_EXTENSIONS.contains(&ext.as_str()) {
        tracing::info!(kind = kind.label(), name = %display_name, ext = %ext, "candidate rejected");
        return ImportOutcome::Rejected {
            hint: extensions_hint(),
        };
    }

    // Open before spawning the copy so a source that cannot be read
    // fails the import without creating anything at the destination.
    let reader = match source.open(&locator) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(kind = kind.label(), name = %display_name, error = %e, "source stream unavailable");
            return ImportOutcome::Failed;
        }
    };

    let destination = clash_dir.join(destination_file_name(kind, &ext));
    let copy =
        tokio::task::spawn_blocking(move || copy_atomically(reader, clash_dir, destination)).await;

    match copy {
        Ok(Ok(bytes)) => {
            tracing::info!(kind = kind.label(), name = %display_name, bytes, "geo database imported");
            ImportOutcome::Succeeded { display_name }
        }
        Ok(Err(e)) => {
            tracing::warn!(kind = kind.label(), name = %display_name, error = %e, "copy failed");
            ImportOutcome::Failed
        }
        Err(e) => {
            tracing::warn!(kind = kind.label(), error = %e, "copy task did not complete");
            ImportOutcome::Failed
        }
    }
}

/// Copy `reader` into `destination` through a temp file in `clash_dir`.
///
/// The temp file is renamed over the destination only after the whole
/// stream has been written and flushed; on any error it is discarded
/// and the destination is left as it was.
fn copy_atomically(
    mut reader: Box<dyn Read + Send>,
    clash_dir: PathBuf,
    destination: PathBuf,
) -> Result<u64, Error> {
    std::fs::create_dir_all(&clash_dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&clash_dir)?;
    let bytes = std::io::copy(&mut reader, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&destination)
        .map_err(|e| Error::ImportFailed(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::{
        ImportKind, ImportOutcome, derived_extension, destination_file_name, extensions_hint,
        import_geo_file,
    };
    use crate::locator::{ContentLocator, FsContentSource};
    use std::sync::Arc;

    /// What: Extension derivation keeps everything after the last dot.
    ///
    /// - Input: names with zero, one, and several dots
    /// - Output: `.ext` for dotted names, degenerate `.` otherwise
    #[test]
    fn derived_extension_cases() {
        assert_eq!(derived_extension("GeoIP2.mmdb"), ".mmdb");
        assert_eq!(derived_extension("geosite.v2.dat"), ".dat");
        assert_eq!(derived_extension("geodata"), ".");
        assert_eq!(derived_extension(""), ".");
        assert_eq!(derived_extension("archive.tar.gz"), ".gz");
    }

    /// What: Destination names are a fixed category-to-stem mapping.
    ///
    /// - Input: each category with a sample extension
    /// - Output: `geoip.mmdb`, `geosite.dat`, `country.db`
    #[test]
    fn destination_names_by_category() {
        assert_eq!(destination_file_name(ImportKind::GeoIp, ".mmdb"), "geoip.mmdb");
        assert_eq!(destination_file_name(ImportKind::GeoSite, ".dat"), "geosite.dat");
        assert_eq!(destination_file_name(ImportKind::Country, ".db"), "country.db");
        assert_eq!(
            destination_file_name(ImportKind::GeoIp, ".metadb"),
            "geoip.metadb"
        );
    }

    /// What: The rejection hint lists the whole whitelist.
    #[test]
    fn hint_lists_whitelist() {
        assert_eq!(extensions_hint(), ".metadb/.db/.dat/.mmdb");
    }

    /// What: A cancelled picker (no locator) fails the import without
    /// touching the destination directory.
    ///
    /// - Input: `None` locator
    /// - Output: `Failed`, clash dir stays empty
    #[tokio::test]
    async fn cancelled_pick_fails_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let clash = dir.path().join("clash");
        let outcome = import_geo_file(
            Arc::new(FsContentSource),
            None,
            ImportKind::GeoIp,
            clash.clone(),
        )
        .await;
        assert_eq!(outcome, ImportOutcome::Failed);
        assert!(!clash.exists() || std::fs::read_dir(&clash).unwrap().next().is_none());
    }

    /// What: A non-whitelisted extension is rejected before any write.
    ///
    /// - Input: existing candidate `rules.txt`
    /// - Output: `Rejected` with the hint, no destination created
    #[tokio::test]
    async fn wrong_extension_rejected_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("rules.txt");
        std::fs::write(&candidate, b"not a database").unwrap();
        let clash = dir.path().join("clash");

        let outcome = import_geo_file(
            Arc::new(FsContentSource),
            Some(ContentLocator::from(candidate.as_path())),
            ImportKind::GeoSite,
            clash.clone(),
        )
        .await;

        assert_eq!(
            outcome,
            ImportOutcome::Rejected {
                hint: ".metadb/.db/.dat/.mmdb".to_string()
            }
        );
        assert!(!clash.join("geosite.txt").exists());
        assert!(!clash.exists() || std::fs::read_dir(&clash).unwrap().next().is_none());
    }

    /// What: A name without any dot is always rejected via the
    /// degenerate `.` extension.
    #[tokio::test]
    async fn dotless_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("geodata");
        std::fs::write(&candidate, b"bytes").unwrap();

        let outcome = import_geo_file(
            Arc::new(FsContentSource),
            Some(ContentLocator::from(candidate.as_path())),
            ImportKind::Country,
            dir.path().join("clash"),
        )
        .await;
        assert!(matches!(outcome, ImportOutcome::Rejected { .. }));
    }

    /// What: A valid candidate lands byte-identical under the
    /// category-derived destination name.
    ///
    /// - Input: `GeoIP2.mmdb` with known bytes, category GeoIp
    /// - Output: `Succeeded` naming the candidate; `clash/geoip.mmdb`
    ///   holds identical bytes
    #[tokio::test]
    async fn valid_candidate_copied_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("GeoIP2.mmdb");
        std::fs::write(&candidate, b"maxmind database payload").unwrap();
        let clash = dir.path().join("clash");

        let outcome = import_geo_file(
            Arc::new(FsContentSource),
            Some(ContentLocator::from(candidate.as_path())),
            ImportKind::GeoIp,
            clash.clone(),
        )
        .await;

        assert_eq!(
            outcome,
            ImportOutcome::Succeeded {
                display_name: "GeoIP2.mmdb".to_string()
            }
        );
        let copied = std::fs::read(clash.join("geoip.mmdb")).unwrap();
        assert_eq!(copied, b"maxmind database payload");
    }

    /// What: A later import of the same category overwrites wholesale.
    ///
    /// - Input: two successive country imports with different bytes
    /// - Output: destination holds exactly the second payload
    #[tokio::test]
    async fn reimport_overwrites_destination() {
        let dir = tempfile::tempdir().unwrap();
        let clash = dir.path().join("clash");
        for payload in [&b"first version"[..], &b"second, longer version"[..]] {
            let candidate = dir.path().join("Country.mmdb");
            std::fs::write(&candidate, payload).unwrap();
            let outcome = import_geo_file(
                Arc::new(FsContentSource),
                Some(ContentLocator::from(candidate.as_path())),
                ImportKind::Country,
                clash.clone(),
            )
            .await;
            assert!(matches!(outcome, ImportOutcome::Succeeded { .. }));
        }
        let copied = std::fs::read(clash.join("country.mmdb")).unwrap();
        assert_eq!(copied, b"second, longer version");
    }

    /// What: An unreadable source fails the import atomically.
    ///
    /// - Input: a directory named like a valid candidate (`x.mmdb/`)
    /// - Output: `Failed`, no destination file, no stray temp files
    #[tokio::test]
    async fn unreadable_source_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("x.mmdb");
        std::fs::create_dir_all(&candidate).unwrap();
        let clash = dir.path().join("clash");

        let outcome = import_geo_file(
            Arc::new(FsContentSource),
            Some(ContentLocator::from(candidate.as_path())),
            ImportKind::GeoIp,
            clash.clone(),
        )
        .await;

        assert_eq!(outcome, ImportOutcome::Failed);
        assert!(!clash.join("geoip.mmdb").exists());
        if clash.exists() {
            assert!(std::fs::read_dir(&clash).unwrap().next().is_none());
        }
    }
}

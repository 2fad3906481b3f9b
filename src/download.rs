//! Document download and on-disk caching.
//!
//! `GET /documents/{docId}?type=1` returns the XBRL bundle as a ZIP archive and
//! `type=2` the PDF rendition. Bundles are unpacked into `{docId}_xbrl/` and the
//! archive is removed; PDFs are stored as `{docId}.pdf`. A target that already exists
//! is a cache hit, so the document id doubles as the idempotency key.

use super::Edinet;
use super::error::{EdinetError, Result};
use super::traits::DocumentStore;
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Which rendition of a filing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// ZIP archive with the XBRL instance and linkbases (`type=1`).
    Bundle,
    /// PDF rendition (`type=2`).
    Pdf,
}

impl DocumentKind {
    pub fn api_type(self) -> u8 {
        match self {
            DocumentKind::Bundle => 1,
            DocumentKind::Pdf => 2,
        }
    }

    /// Final on-disk location for `doc_id` under `dir`.
    pub fn target_path(self, dir: &Path, doc_id: &str) -> PathBuf {
        match self {
            DocumentKind::Bundle => dir.join(format!("{}_xbrl", doc_id)),
            DocumentKind::Pdf => dir.join(format!("{}.pdf", doc_id)),
        }
    }
}

fn validate_doc_id(doc_id: &str) -> Result<()> {
    if doc_id.is_empty() || !doc_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EdinetError::ConfigError(format!(
            "Invalid document id: {:?}",
            doc_id
        )));
    }
    Ok(())
}

/// Unpacks `zip_path` into `to_dir` and returns the number of files written.
///
/// Entries whose names would escape `to_dir` (absolute paths, `..`) are skipped.
pub fn extract_bundle(zip_path: &Path, to_dir: &Path) -> Result<usize> {
    tracing::debug!("unzipping {} to {}", zip_path.display(), to_dir.display());

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        tracing::error!("failed to open zip file at {}: {}", zip_path.display(), e);
        e
    })?;

    std::fs::create_dir_all(to_dir)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry {:?}", entry.name());
            continue;
        };
        let outpath = to_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&outpath)?;
        tracing::trace!("copying {} to {}", entry.name(), outpath.display());
        io::copy(&mut entry, &mut outfile)?;
        written += 1;
    }

    Ok(written)
}

/// EDINET answers a missing rendition with a small JSON body instead of a 404.
fn reject_json_body(doc_id: &str, bytes: &[u8]) -> Result<()> {
    let head = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if head == Some(&b'{') {
        let preview: String = String::from_utf8_lossy(bytes).chars().take(200).collect();
        return Err(EdinetError::InvalidResponse(format!(
            "Document {} returned JSON instead of a file: {}",
            doc_id, preview
        )));
    }
    Ok(())
}

impl Edinet {
    fn document_url(&self, doc_id: &str, kind: DocumentKind) -> String {
        format!(
            "{}/documents/{}?type={}",
            self.base_url,
            doc_id,
            kind.api_type()
        )
    }

    /// Downloads into the configured download directory.
    pub async fn download_to_cache(&self, doc_id: &str, kind: DocumentKind) -> Result<PathBuf> {
        let dir = self.download_dir.clone();
        self.download(doc_id, kind, &dir).await
    }
}

#[async_trait]
impl DocumentStore for Edinet {
    /// Downloads a filing rendition.
    ///
    /// # Errors
    ///
    /// * `EdinetError::ConfigError` - `doc_id` is not a plain alphanumeric id
    /// * `EdinetError::MissingCredential` - No subscription key configured
    /// * `EdinetError::NotFound` - EDINET has no such document
    /// * `EdinetError::ArchiveError` - The bundle is not a readable ZIP archive
    async fn download(&self, doc_id: &str, kind: DocumentKind, dir: &Path) -> Result<PathBuf> {
        validate_doc_id(doc_id)?;

        let target = kind.target_path(dir, doc_id);
        if target.exists() {
            tracing::debug!("Cache hit for {} at {}", doc_id, target.display());
            return Ok(target);
        }

        tokio::fs::create_dir_all(dir).await?;

        let url = self.document_url(doc_id, kind);
        let bytes = self.get_bytes(&url).await?;
        reject_json_body(doc_id, &bytes)?;

        match kind {
            DocumentKind::Pdf => {
                let partial = dir.join(format!("{}.pdf.part", doc_id));
                tokio::fs::write(&partial, &bytes).await?;
                tokio::fs::rename(&partial, &target).await?;
            }
            DocumentKind::Bundle => {
                let zip_path = dir.join(format!("{}_xbrl.zip", doc_id));
                tokio::fs::write(&zip_path, &bytes).await?;

                let (zip_clone, target_clone) = (zip_path.clone(), target.clone());
                let extracted =
                    tokio::task::spawn_blocking(move || extract_bundle(&zip_clone, &target_clone))
                        .await
                        .map_err(|e| EdinetError::ArchiveError(e.to_string()))?;

                if let Err(e) = tokio::fs::remove_file(&zip_path).await {
                    tracing::warn!("Failed to remove {}: {}", zip_path.display(), e);
                }

                match extracted {
                    Ok(count) => tracing::info!("Extracted {} files for {}", count, doc_id),
                    Err(e) => {
                        let _ = tokio::fs::remove_dir_all(&target).await;
                        return Err(e);
                    }
                }
            }
        }

        Ok(target)
    }
}

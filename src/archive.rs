//! Model archive
//!
//! A saved bundle is a directory:
//!
//! ```text
//! <archive>/manifest.json         format version, creation time, one entry per site
//! <archive>/models/<digest>.bin   encoded model payloads, named by blake3 digest
//! ```
//!
//! Payloads are content addressed, so re-saving an unchanged model is a no-op
//! on disk unless the existing payload no longer matches its digest, in which
//! case it is rewritten. Every file is written to a `.tmp` sibling and renamed into place;
//! the manifest is written last, so a reader never sees a manifest that
//! references a missing payload.

use crate::error::ArchiveError;
use crate::model::{ModelBundle, ModelRegistry};
use crate::op::{OpInfo, Sid};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Current archive layout version
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MODELS_DIR: &str = "models";

fn default_verify_checksums() -> bool {
    true
}

/// Archive settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Recompute payload digests on restore
    #[serde(default = "default_verify_checksums")]
    pub verify_checksums: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            verify_checksums: default_verify_checksums(),
        }
    }
}

/// Top-level archive manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub format_version: u32,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    pub sites: Vec<ArchiveEntry>,
}

/// One site's model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub sid: Sid,
    pub op_info: OpInfo,
    pub kind: String,
    /// Payload path relative to the archive root
    pub payload: String,
    /// blake3 digest of the payload, hex encoded
    pub checksum: String,
}

fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

fn io_error(kind: std::io::ErrorKind, message: String) -> ArchiveError {
    ArchiveError::IoError(std::io::Error::new(kind, message))
}

/// Write `bytes` to `path` via a temporary sibling and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes).map_err(|e| {
        io_error(
            std::io::ErrorKind::Other,
            format!("Failed to write {:?}: {}", temp_path, e),
        )
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        // Clean up temp file on error
        let _ = fs::remove_file(&temp_path);
        io_error(
            std::io::ErrorKind::Other,
            format!("Failed to rename temp file to {:?}: {}", path, e),
        )
    })
}

/// Save every site model of `bundle` under the directory `path`.
///
/// Payloads no longer referenced by the new manifest are removed afterwards.
pub fn save_model<P: AsRef<Path>>(bundle: &ModelBundle, path: P) -> Result<ArchiveManifest, ArchiveError> {
    let root = path.as_ref();
    let models_dir = root.join(MODELS_DIR);
    fs::create_dir_all(&models_dir).map_err(|e| {
        io_error(
            std::io::ErrorKind::Other,
            format!("Failed to create archive directory {:?}: {}", models_dir, e),
        )
    })?;

    let mut sites = Vec::with_capacity(bundle.len());
    let mut referenced = HashSet::new();
    for (sid, site) in bundle.iter() {
        let bytes = site.model.encode()?;
        let checksum = digest_hex(&bytes);
        let file_name = format!("{}.bin", checksum);
        let payload_path = models_dir.join(&file_name);
        match fs::read(&payload_path) {
            Ok(existing) if digest_hex(&existing) == checksum => {}
            Ok(_) => {
                warn!(path = %payload_path.display(), "Rewriting corrupt model payload");
                write_atomic(&payload_path, &bytes)?;
            }
            Err(_) => write_atomic(&payload_path, &bytes)?,
        }
        referenced.insert(file_name.clone());

        sites.push(ArchiveEntry {
            sid: sid.clone(),
            op_info: site.info.clone(),
            kind: site.model.kind().to_string(),
            payload: format!("{}/{}", MODELS_DIR, file_name),
            checksum,
        });
    }

    let manifest = ArchiveManifest {
        format_version: ARCHIVE_FORMAT_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
        sites,
    };
    let serialized = serde_json::to_vec_pretty(&manifest).map_err(|e| {
        io_error(
            std::io::ErrorKind::Other,
            format!("Failed to serialize archive manifest: {}", e),
        )
    })?;
    write_atomic(&root.join(MANIFEST_FILE), &serialized)?;

    let removed = remove_stale_payloads(&models_dir, &referenced)?;
    info!(
        path = %root.display(),
        sites = manifest.sites.len(),
        removed_payloads = removed,
        "Model archive saved"
    );
    Ok(manifest)
}

fn remove_stale_payloads(models_dir: &Path, referenced: &HashSet<String>) -> Result<usize, ArchiveError> {
    let mut removed = 0;
    for entry in fs::read_dir(models_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".bin") && !referenced.contains(&name) {
            fs::remove_file(entry.path())?;
            debug!(payload = %name, "Removed stale payload");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Read and version-check the manifest of the archive at `path`.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<ArchiveManifest, ArchiveError> {
    let manifest_path = path.as_ref().join(MANIFEST_FILE);
    let bytes = fs::read(&manifest_path).map_err(|e| {
        io_error(e.kind(), format!("Failed to read manifest {:?}: {}", manifest_path, e))
    })?;

    // Check the version before committing to the current layout.
    let raw: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ArchiveError::Corrupt(format!("Manifest is not valid JSON: {}", e)))?;
    let found = raw
        .get("format_version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| ArchiveError::Corrupt("Manifest has no format_version".to_string()))?;
    if found != u64::from(ARCHIVE_FORMAT_VERSION) {
        return Err(ArchiveError::IncompatibleArchive {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            expected: ARCHIVE_FORMAT_VERSION,
        });
    }

    serde_json::from_value(raw)
        .map_err(|e| ArchiveError::Corrupt(format!("Invalid manifest: {}", e)))
}

/// Restore a bundle saved by [`save_model`] using the built-in model kinds.
pub fn restore_model<P: AsRef<Path>>(path: P) -> Result<ModelBundle, ArchiveError> {
    restore_model_with(path, &ModelRegistry::with_builtin(), &ArchiveConfig::default())
}

/// Restore a bundle, decoding payloads with `registry`.
///
/// Either every site is restored or an error is returned.
pub fn restore_model_with<P: AsRef<Path>>(
    path: P,
    registry: &ModelRegistry,
    config: &ArchiveConfig,
) -> Result<ModelBundle, ArchiveError> {
    let root = path.as_ref();
    let manifest = read_manifest(root)?;

    let mut bundle = ModelBundle::new();
    for entry in manifest.sites {
        if entry.op_info.sid() != entry.sid {
            return Err(ArchiveError::Corrupt(format!(
                "Entry {} does not match its op info ({})",
                entry.sid,
                entry.op_info.sid()
            )));
        }
        if !registry.contains(&entry.kind) {
            return Err(ArchiveError::UnknownModelKind {
                sid: entry.sid.to_string(),
                kind: entry.kind,
            });
        }

        let payload_path = payload_path(root, &entry)?;
        let bytes = fs::read(&payload_path).map_err(|e| {
            io_error(e.kind(), format!("Failed to read payload {:?}: {}", payload_path, e))
        })?;
        if config.verify_checksums {
            let actual = digest_hex(&bytes);
            if actual != entry.checksum {
                return Err(ArchiveError::Corrupt(format!(
                    "Checksum mismatch for {}: expected {}, found {}",
                    entry.sid, entry.checksum, actual
                )));
            }
        }

        let model = registry.decode(&entry.kind, &bytes)?;
        bundle.insert(entry.op_info, model);
    }

    info!(path = %root.display(), sites = bundle.len(), "Model archive restored");
    Ok(bundle)
}

/// Resolve an entry's payload path, refusing anything outside the archive.
fn payload_path(root: &Path, entry: &ArchiveEntry) -> Result<PathBuf, ArchiveError> {
    let relative = Path::new(&entry.payload);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !contained {
        return Err(ArchiveError::Corrupt(format!(
            "Payload path for {} escapes the archive: {}",
            entry.sid, entry.payload
        )));
    }
    Ok(root.join(relative))
}

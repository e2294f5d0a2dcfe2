//! # File I/O
//!
//! Saving and loading design documents:
//! - **Atomic saves**: write to a `.tmp` sibling, fsync, then rename over the
//!   target so an interrupted save never leaves a truncated file
//! - **Version validation**: reject files written by an incompatible schema
//!
//! Design files hold plain JSON and conventionally use the `.layup`
//! extension.
//!
//! ## Example
//!
//! ```rust,no_run
//! use layup_core::document::DesignDocument;
//! use layup_core::file_io::{load_design, save_design};
//! use std::path::Path;
//!
//! let doc = DesignDocument::new("Bat 34in", "Designer");
//! save_design(&doc, Path::new("bat.layup"))?;
//! let loaded = load_design(Path::new("bat.layup"))?;
//! assert_eq!(loaded.meta.name, "Bat 34in");
//! # Ok::<(), layup_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::document::{DesignDocument, SCHEMA_VERSION};
use crate::errors::{CalcError, CalcResult};

/// Temporary path used while saving `path`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save a design with atomic write semantics.
///
/// 1. Serialize to JSON
/// 2. Write to `<path>.tmp`
/// 3. Sync to disk
/// 4. Rename over `path`
pub fn save_design(doc: &DesignDocument, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(doc)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!("saved design '{}' to {}", doc.meta.name, path.display());
    Ok(())
}

/// Load a design and check its schema version.
///
/// # Returns
///
/// * `Err(CalcError::VersionMismatch)` - written by an incompatible schema
/// * `Err(CalcError::SerializationError)` - invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_design(path: &Path) -> CalcResult<DesignDocument> {
    let mut file = File::open(path)
        .map_err(|e| CalcError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let doc: DesignDocument = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&doc.meta.version)?;
    info!("loaded design '{}' ({} objects)", doc.meta.name, doc.objects.len());
    Ok(doc)
}

fn parse_version(version: &str) -> Vec<u32> {
    version.split('.').filter_map(|p| p.parse().ok()).collect()
}

/// Accept files with the same major version. While the schema is 0.x, a
/// file from a newer minor version is rejected too.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file = parse_version(file_version);
    let current = parse_version(SCHEMA_VERSION);
    let (Some(&file_major), Some(&current_major)) = (file.first(), current.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if current_major == 0 {
        if let (Some(&file_minor), Some(&current_minor)) = (file.get(1), current.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Entity;
    use crate::materials::library;
    use crate::settings::AnalysisSettings;
    use std::env::temp_dir;
    use std::rc::Rc;

    fn temp_design_path(name: &str) -> PathBuf {
        temp_dir().join(format!("layup_test_{}_{}.layup", name, std::process::id()))
    }

    #[test]
    fn test_tmp_path_generation() {
        assert_eq!(tmp_path_for(Path::new("/designs/bat.layup")), Path::new("/designs/bat.layup.tmp"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_design_path("roundtrip");
        let epoxy = Rc::new(library::material("epoxy").unwrap());
        let doc = DesignDocument::encode("Bat", "Tester", AnalysisSettings::default(), &[Entity::Material(epoxy)])
            .unwrap();

        save_design(&doc, &path).unwrap();
        let loaded = load_design(&path).unwrap();
        assert_eq!(loaded.meta.name, "Bat");
        assert_eq!(loaded.meta.designer, "Tester");
        assert_eq!(loaded.decode().unwrap(), doc.decode().unwrap());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_design_path("atomic");
        save_design(&DesignDocument::new("x", "y"), &path).unwrap();
        assert!(!tmp_path_for(&path).exists());
        assert!(path.exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_design(&temp_design_path("missing")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_design_path("garbage");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_design(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let path = temp_design_path("newer");
        let mut doc = DesignDocument::new("future", "y");
        doc.meta.version = "0.9.0".to_string();
        save_design(&doc, &path).unwrap();
        assert_eq!(load_design(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.3").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("latest").is_err());
    }
}

//! Writing a finished build to disk.
//!
//! The manifest is the commit point of a build: templates only ever see hashed
//! names through it, so it is removed first and written last.
//!
//! 1. Remove the previous manifest.
//! 2. Clean the output directory (optional).
//! 3. Write every artifact to a temporary file, then rename it into place.
//! 4. Write the manifest the same way.
//!
//! If step 3 fails, temporary files and every file this build created are
//! deleted again and no manifest is written. Files that already existed
//! before the build (same name, therefore same content) are left alone.
//!
//! Every artifact path is normalized with `path_clean` and must stay inside
//! the output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::manifest::Manifest;
use crate::output::Artifact;
use crate::{Error, Result};

const TEMP_SUFFIX: &str = ".satchel-tmp";

/// Write `artifacts` and then `manifest` into `dir`.
pub fn write_build(
    dir: &Path,
    artifacts: &[Artifact],
    manifest: &Manifest,
    manifest_name: &str,
    clean: bool,
) -> Result<()> {
    let dir = validate_and_normalize_dir(dir)?;
    let manifest_path = validate_output_path(&dir, manifest_name)?;

    if manifest_path.is_file() {
        fs::remove_file(&manifest_path).map_err(|source| Error::Write {
            path: manifest_path.clone(),
            source,
        })?;
    }

    if clean {
        clean_output_dir(&dir)?;
    } else {
        fs::create_dir_all(&dir).map_err(|source| Error::Write {
            path: dir.clone(),
            source,
        })?;
    }

    let mut operations = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let target = validate_output_path(&dir, &artifact.file_name)?;
        operations.push((target, artifact.contents.as_slice()));
    }
    write_files_atomic(&operations)?;

    let json = manifest.to_json()?;
    write_files_atomic(&[(manifest_path, json.as_bytes())])?;

    tracing::debug!(
        dir = %dir.display(),
        files = artifacts.len(),
        "output written"
    );
    Ok(())
}

fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("failed to get current directory: {e}"))
    })?;
    Ok(cwd.join(cleaned).clean())
}

/// Remove everything inside `dir` but keep the directory itself.
fn clean_output_dir(dir: &Path) -> Result<()> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| Error::Write { path, source }
    };

    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(write_err(dir));
    }
    if !dir.is_dir() {
        return Err(Error::InvalidOutputPath(format!(
            "output path exists but is not a directory: {}",
            dir.display()
        )));
    }

    for entry in fs::read_dir(dir).map_err(write_err(dir))? {
        let path = entry.map_err(write_err(dir))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(write_err(&path))?;
        } else {
            fs::remove_file(&path).map_err(write_err(&path))?;
        }
    }
    tracing::debug!(dir = %dir.display(), "output directory cleaned");
    Ok(())
}

/// Join `file_name` onto `base_dir`, refusing anything that escapes it.
fn validate_output_path(base_dir: &Path, file_name: &str) -> Result<PathBuf> {
    if file_name.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "file name contains null byte".to_string(),
        ));
    }
    if file_name.is_empty() {
        return Err(Error::InvalidOutputPath("empty file name".to_string()));
    }

    let full_path = base_dir.join(Path::new(file_name).clean()).clean();
    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}' (resolved to '{}')",
            file_name,
            base_dir.display(),
            full_path.display()
        )));
    }
    Ok(full_path)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

struct Staged {
    temp: PathBuf,
    target: PathBuf,
    existed: bool,
}

/// Two-phase write: all temp files first, then renames. Rolls back on failure.
fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut staged: Vec<Staged> = Vec::with_capacity(operations.len());

    for (target, contents) in operations {
        let temp = temp_path(target);
        let result = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&temp, contents));
        if let Err(source) = result {
            rollback(&staged, 0);
            let _ = fs::remove_file(&temp);
            return Err(Error::Write {
                path: target.clone(),
                source,
            });
        }
        staged.push(Staged {
            temp,
            target: target.clone(),
            existed: target.exists(),
        });
    }

    for (done, file) in staged.iter().enumerate() {
        if let Err(source) = rename_into_place(file) {
            rollback(&staged, done);
            return Err(Error::Write {
                path: file.target.clone(),
                source,
            });
        }
    }

    Ok(())
}

fn rename_into_place(file: &Staged) -> io::Result<()> {
    if file.target.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a directory is in the way",
        ));
    }
    fs::rename(&file.temp, &file.target)
}

/// Delete every temp file and the first `renamed` targets this build created.
fn rollback(staged: &[Staged], renamed: usize) {
    for (i, file) in staged.iter().enumerate() {
        if file.temp.exists() {
            if let Err(e) = fs::remove_file(&file.temp) {
                tracing::warn!(path = %file.temp.display(), error = %e, "failed to remove temporary file");
            }
        }
        if i < renamed && !file.existed {
            if let Err(e) = fs::remove_file(&file.target) {
                tracing::warn!(path = %file.target.display(), error = %e, "failed to roll back file");
            }
        }
    }
}

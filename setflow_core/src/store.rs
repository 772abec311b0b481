//! Template persistence with file locking.
//!
//! Templates are stored as one JSON file each under `data_dir/templates/`.
//! Saves go through a temp file in the same directory and an atomic rename,
//! so a reader never sees a half-written template.

use crate::pairing::Template;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Path of the template named `name` under `data_dir`
pub fn template_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join("templates").join(format!("{}.json", name))
}

impl Template {
    /// Load a template with a shared lock
    ///
    /// A missing file yields an empty template with the file's stem as its
    /// name. An unreadable or corrupted file is an error: silently replacing
    /// authored work with an empty template would lose it on the next save.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!("No template at {:?}, starting empty", path);
            return Ok(Self::new(name));
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let template: Template = serde_json::from_str(&contents).map_err(|e| {
            Error::Template(format!("Failed to parse template {:?}: {}", path, e))
        })?;
        tracing::debug!("Loaded template {:?} ({} slots)", template.name, template.slots.len());
        Ok(template)
    }

    /// Atomically replace the template file
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Template(format!("template path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved template {:?} to {:?}", self.name, path);
        Ok(())
    }

    /// Load, modify and save back
    pub fn update<F, T>(path: &Path, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut Template) -> Result<T>,
    {
        let mut template = Self::load(path)?;
        let out = f(&mut template)?;
        template.save(path)?;
        Ok((template, out))
    }
}

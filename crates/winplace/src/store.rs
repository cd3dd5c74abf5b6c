//! RON file persistence for [`WindowAspects`].

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use ron::ser::{self, PrettyConfig};
use tracing::{debug, warn};

use crate::{Error, Result, aspects::WindowAspects, notice::LayoutSink};

/// Stores one aspects record in a RON file.
#[derive(Debug, Clone)]
pub struct AspectsStore {
    /// Backing file.
    path: PathBuf,
}

impl AspectsStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record; a missing file yields `None`.
    pub fn load(&self) -> Result<Option<WindowAspects>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "aspects_missing");
                return Ok(None);
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        let aspects: WindowAspects = ron::from_str(&text)?;
        aspects.validate()?;
        Ok(Some(aspects))
    }

    /// Load the record, treating any failure as "nothing saved".
    pub fn load_or_default(&self) -> Option<WindowAspects> {
        match self.load() {
            Ok(a) => a,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "aspects_unreadable");
                None
            }
        }
    }

    /// Write the record via a temporary sibling file and a rename.
    pub fn save(&self, aspects: &WindowAspects) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        let text = ser::to_string_pretty(aspects, PrettyConfig::default())?;
        let tmp = self.path.with_extension("ron.tmp");
        fs::write(&tmp, text).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::io(&self.path, e))?;
        debug!(path = %self.path.display(), "aspects_saved");
        Ok(())
    }
}

impl LayoutSink for AspectsStore {
    fn save_tree_state(&self, aspects: &WindowAspects) -> Result<()> {
        self.save(aspects)
    }
}

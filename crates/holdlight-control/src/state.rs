//! Application state handed to front-end handlers
//!
//! Created once at startup and passed by reference; there is no global.
//! Loading a layout swaps the panel contents under the lock, so a running
//! runner picks up the new pixels on its next frame.

use std::path::{Path, PathBuf};
use tracing::info;

use holdlight_core::layout;

use crate::{
    error::Result,
    runner::SharedPanel,
};

pub struct AppState {
    panel: SharedPanel,
    source: Option<PathBuf>,
}

impl AppState {
    pub fn new(panel: SharedPanel) -> Self {
        Self {
            panel,
            source: None,
        }
    }

    pub fn panel(&self) -> SharedPanel {
        self.panel.clone()
    }

    /// File the current panel was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Replace the panel with a layout file. On error the current panel is
    /// left untouched. Returns the new pixel count.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let loaded = layout::load(path)?;
        Ok(self.replace(loaded, path))
    }

    /// Like [`AppState::load`], keeping only pixels of one panel id.
    pub fn load_panel(&mut self, path: impl AsRef<Path>, panel_id: i32) -> Result<usize> {
        let path = path.as_ref();
        let loaded = layout::load_panel(path, panel_id)?;
        Ok(self.replace(loaded, path))
    }

    fn replace(&mut self, loaded: holdlight_core::Panel, path: &Path) -> usize {
        let count = loaded.len();
        *self.panel.lock() = loaded;
        self.source = Some(path.to_path_buf());
        info!("Loaded {} pixels from {}", count, path.display());
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;
    use crate::runner::shared;
    use holdlight_core::{CoreError, Panel};

    #[test]
    fn test_load_replaces_shared_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.txt");
        std::fs::write(&path, "0 0 0 0\n0 3 1 0\n").unwrap();

        let panel = shared(Panel::blank(4, 4).unwrap());
        let mut state = AppState::new(panel.clone());
        assert_eq!(state.load(&path).unwrap(), 2);

        assert_eq!(panel.lock().len(), 2);
        assert_eq!(state.source(), Some(path.as_path()));
    }

    #[test]
    fn test_failed_load_keeps_current_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "0 0 0\n").unwrap();

        let panel = shared(Panel::blank(2, 2).unwrap());
        let mut state = AppState::new(panel.clone());
        let err = state.load(&path).unwrap_err();

        assert!(matches!(
            err,
            ControlError::Core(CoreError::Validation { line: Some(1), .. })
        ));
        assert_eq!(panel.lock().len(), 4);
        assert_eq!(state.source(), None);
    }
}

//! Revealing the output folder in the native file browser.

use std::path::Path;

use crate::error::ShellRevealError;

pub trait ShellReveal: Send + Sync {
    fn reveal(&self, dir: &Path) -> Result<(), ShellRevealError>;
}

/// Opens the folder with the platform handler (Finder, Explorer, xdg-open).
#[derive(Debug, Default, Clone)]
pub struct OpenReveal;

impl ShellReveal for OpenReveal {
    fn reveal(&self, dir: &Path) -> Result<(), ShellRevealError> {
        open::that_detached(dir).map_err(|source| ShellRevealError {
            path: dir.to_path_buf(),
            source,
        })
    }
}

/// Used when revealing is turned off in the configuration.
#[derive(Debug, Default, Clone)]
pub struct NoReveal;

impl ShellReveal for NoReveal {
    fn reveal(&self, _dir: &Path) -> Result<(), ShellRevealError> {
        Ok(())
    }
}

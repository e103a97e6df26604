use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "Gemfile";

/// Locates the dependency manifest that pins the toolchain for a project.
pub trait ManifestProbe {
    fn manifest_path(&self, working_dir: &Path) -> Option<PathBuf>;
}

/// Finds the nearest `Gemfile` in the working directory or its ancestors.
#[derive(Debug, Default, Clone, Copy)]
pub struct GemfileProbe;

impl ManifestProbe for GemfileProbe {
    fn manifest_path(&self, working_dir: &Path) -> Option<PathBuf> {
        working_dir
            .ancestors()
            .map(|dir| dir.join(MANIFEST_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }
}

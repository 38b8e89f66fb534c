use crate::config::validation::validate_project_name;
use crate::LumiError;
use std::path::PathBuf;

/// Where a project's images and captions are written
///
/// Every project owns `<root>/<project>`; files inside are named
/// `<project>_<n>.<ext>` and `<project>_<n>.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    pub fn image_path(&self, project: &str, number: u32, extension: &str) -> PathBuf {
        self.project_dir(project)
            .join(format!("{}_{}.{}", project, number, extension))
    }

    pub fn caption_path(&self, project: &str, number: u32) -> PathBuf {
        self.project_dir(project)
            .join(format!("{}_{}.txt", project, number))
    }

    /// Creates the project directory (and the root) if missing
    pub fn prepare_project(&self, project: &str) -> Result<PathBuf, LumiError> {
        let dir = self.project_dir(project);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Deletes a project's output directory
    ///
    /// Returns `Ok(false)` when there was nothing to delete.
    pub fn clean_project(&self, project: &str) -> Result<bool, LumiError> {
        validate_project_name(project)?;
        let dir = self.project_dir(project);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

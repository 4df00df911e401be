//! Module path validation and project directory resolution

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};

/// Where a new project goes and what it is called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTarget {
    /// Module path that replaces the template's own module path
    pub module_path: String,
    /// Directory the template is cloned into
    pub project_dir: Utf8PathBuf,
}

impl ProjectTarget {
    /// Validate `module_path` and derive the project directory under `work_dir`
    ///
    /// Surrounding whitespace is ignored. The directory is named after the last
    /// path segment with any `.git` suffix removed.
    pub fn resolve(module_path: &str, work_dir: &Utf8Path) -> Result<Self> {
        let module_path = module_path.trim();
        validate_module_path(module_path)?;

        let name = project_name(module_path)?;
        Ok(Self {
            module_path: module_path.to_string(),
            project_dir: work_dir.join(name),
        })
    }

    /// Fail if the project directory is already present
    pub fn ensure_absent(&self) -> Result<()> {
        match std::fs::symlink_metadata(&self.project_dir) {
            Ok(_) => Err(Error::project_exists(self.project_dir.as_str())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::file_io("check", self.project_dir.as_str(), e)),
        }
    }
}

/// Check that a module path looks like `host.tld/segment[/segment...]`
pub fn validate_module_path(module_path: &str) -> Result<()> {
    if module_path.is_empty() {
        return Err(Error::ModulePathRequired);
    }

    let path = || module_path.to_string();

    if module_path.chars().any(char::is_whitespace) {
        return Err(Error::ModulePathWhitespace { path: path() });
    }
    if module_path.starts_with('/') || module_path.ends_with('/') {
        return Err(Error::ModulePathSlash { path: path() });
    }

    let parts: Vec<&str> = module_path.split('/').collect();
    if parts.len() < 2 {
        return Err(Error::ModulePathTooShort { path: path() });
    }
    if !parts[0].contains('.') {
        return Err(Error::ModulePathHost { path: path() });
    }
    if parts.iter().any(|part| part.is_empty()) {
        return Err(Error::ModulePathEmptySegment { path: path() });
    }

    Ok(())
}

/// Directory name for a validated module path
pub fn project_name(module_path: &str) -> Result<String> {
    let last = module_path.rsplit('/').next().unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidProjectName {
            path: module_path.to_string(),
        });
    }

    Ok(name.to_string())
}

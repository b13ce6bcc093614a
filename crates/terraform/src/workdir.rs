//! Per-run working directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use vmm_domain::{Error, Result};

/// A staged working directory.
///
/// [`Workdir::remove`] deletes it without blocking the runtime. A workdir
/// dropped without `remove` (error return, cancelled run) is deleted
/// synchronously in `Drop`.
#[derive(Debug)]
pub struct Workdir {
    path: PathBuf,
    removed: bool,
}

impl Workdir {
    /// Create `<root>/<name>` and link each asset into it.
    ///
    /// Relative asset sources resolve against the process working directory.
    pub async fn stage(root: &Path, name: &str, assets: &BTreeMap<PathBuf, String>) -> Result<Self> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::provisioning(
                "workdir",
                format!("invalid working directory name {name:?}"),
            ));
        }

        let path = root.join(name);
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            Error::provisioning("workdir", format!("creating {}: {e}", path.display()))
        })?;
        let workdir = Self {
            path,
            removed: false,
        };

        let cwd = std::env::current_dir()
            .map_err(|e| Error::provisioning("assets", format!("resolving cwd: {e}")))?;
        for (src, dest) in assets {
            let src = if src.is_absolute() { src.clone() } else { cwd.join(src) };
            let link = workdir.path.join(dest);
            symlink(&src, &link).await.map_err(|e| {
                Error::provisioning(
                    "assets",
                    format!("linking {} -> {}: {e}", link.display(), src.display()),
                )
            })?;
        }

        tracing::debug!(path = %workdir.path.display(), assets = assets.len(), "workdir staged");
        Ok(workdir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(mut self) {
        let result = tokio::fs::remove_dir_all(&self.path).await;
        log_removal(&self.path, result);
        self.removed = true;
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        // Blocks the worker thread; staged dirs hold a tfvars file, links
        // and terraform state, so this stays short.
        log_removal(&self.path, std::fs::remove_dir_all(&self.path));
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(path = %path.display(), "workdir removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove workdir"),
    }
}

#[cfg(unix)]
async fn symlink(src: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(src, link).await
}

#[cfg(windows)]
async fn symlink(src: &Path, link: &Path) -> std::io::Result<()> {
    if tokio::fs::metadata(src).await.map(|m| m.is_dir()).unwrap_or(false) {
        tokio::fs::symlink_dir(src, link).await
    } else {
        tokio::fs::symlink_file(src, link).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stages_links_and_cleans_up() {
        let assets_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let main_tf = assets_dir.path().join("main.tf");
        std::fs::write(&main_tf, "# main").unwrap();
        let assets = BTreeMap::from([(main_tf, "main.tf".to_string())]);

        let workdir = Workdir::stage(root.path(), "omt_1", &assets).await.unwrap();
        let path = workdir.path().to_path_buf();
        assert_eq!(path, root.path().join("omt_1"));
        assert_eq!(std::fs::read_to_string(path.join("main.tf")).unwrap(), "# main");
        assert!(std::fs::symlink_metadata(path.join("main.tf"))
            .unwrap()
            .file_type()
            .is_symlink());

        drop(workdir);
        assert!(!path.exists());
        assert!(assets_dir.path().join("main.tf").exists());
    }

    #[tokio::test]
    async fn remove_deletes_the_directory() {
        let root = tempfile::tempdir().unwrap();
        let workdir = Workdir::stage(root.path(), "omt_3", &BTreeMap::new()).await.unwrap();
        let path = workdir.path().to_path_buf();
        std::fs::write(path.join("terraform.tfvars"), "a = \"b\"").unwrap();

        workdir.remove().await;
        assert!(!path.exists());
        assert!(root.path().exists());
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let root = tempfile::tempdir().unwrap();
        for name in ["", "..", "a/b"] {
            let err = Workdir::stage(root.path(), name, &BTreeMap::new())
                .await
                .unwrap_err();
            assert!(err.to_string().contains("workdir"), "{name}: {err}");
        }
    }

    #[tokio::test]
    async fn failed_link_still_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let assets = BTreeMap::from([
            (PathBuf::from("/nonexistent/a"), "same".to_string()),
            (PathBuf::from("/nonexistent/b"), "same".to_string()),
        ]);

        let err = Workdir::stage(root.path(), "omt_2", &assets).await.unwrap_err();
        assert!(err.to_string().starts_with("provisioning assets"));
        assert!(!root.path().join("omt_2").exists());
    }
}

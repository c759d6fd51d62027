use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::AppError;

/// URL prefix the plot store is served under.
pub const MEDIA_URL_PREFIX: &str = "/media/plots";

/// On-disk location of rendered charts.
#[derive(Debug, Clone)]
pub struct PlotStore {
    root: PathBuf,
    shared: bool,
}

/// Directory one upload writes its charts into, plus the matching URL prefix.
#[derive(Debug, Clone)]
pub struct PlotSession {
    dir: PathBuf,
    url_prefix: String,
}

impl PlotStore {
    pub fn new(root: impl Into<PathBuf>, shared: bool) -> Self {
        Self { root: root.into(), shared }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            AppError::Resource(format!("Cannot create plot store {}: {}", self.root.display(), e))
        })
    }

    /// Opens the output location for one request. Unless the store is shared,
    /// each call gets a fresh subdirectory so concurrent uploads never
    /// overwrite each other's charts.
    pub fn open_session(&self) -> Result<PlotSession, AppError> {
        let session = if self.shared {
            PlotSession {
                dir: self.root.clone(),
                url_prefix: MEDIA_URL_PREFIX.to_string(),
            }
        } else {
            let id = Uuid::new_v4().simple().to_string();
            PlotSession {
                dir: self.root.join(&id),
                url_prefix: format!("{}/{}", MEDIA_URL_PREFIX, id),
            }
        };

        std::fs::create_dir_all(&session.dir).map_err(|e| {
            AppError::Resource(format!("Cannot create plot directory {}: {}", session.dir.display(), e))
        })?;
        tracing::debug!("Writing plots to {}", session.dir.display());

        Ok(session)
    }
}

impl PlotSession {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn url(&self, file_name: &str) -> String {
        format!("{}/{}", self.url_prefix, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_store_uses_flat_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlotStore::new(dir.path(), true);
        let session = store.open_session().unwrap();

        assert_eq!(session.dir(), dir.path());
        assert_eq!(session.url("region_bar.png"), "/media/plots/region_bar.png");
    }

    #[test]
    fn request_scoped_sessions_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlotStore::new(dir.path().join("plots"), false);

        let first = store.open_session().unwrap();
        let second = store.open_session().unwrap();

        assert_ne!(first.dir(), second.dir());
        assert!(first.dir().is_dir() && second.dir().is_dir());
        assert_ne!(first.url("score_hist.png"), second.url("score_hist.png"));

        let id = first.dir().file_name().unwrap().to_str().unwrap().to_string();
        assert_eq!(first.url("score_hist.png"), format!("/media/plots/{}/score_hist.png", id));
    }
}

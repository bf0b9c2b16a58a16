pub mod analyze;
pub mod config;
pub mod sessions;
pub mod show;
pub mod version;
pub mod watch;

use ccspy_transcript::{latest_session, Paths, SessionFile};
use std::time::SystemTime;

/// The session named by `id`, or the newest one for the current directory
pub fn resolve_session(paths: &Paths, id: Option<&str>) -> anyhow::Result<SessionFile> {
    match id {
        Some(id) => {
            let path = paths.find_session(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "session {} not found under {}",
                    id,
                    paths.projects_dir().display()
                )
            })?;
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Ok(SessionFile {
                id: id.to_string(),
                path,
                modified,
            })
        }
        None => {
            let project_dir = paths.project_dir()?;
            if !project_dir.is_dir() {
                anyhow::bail!(
                    "No Claude Code sessions for this directory ({} does not exist)",
                    project_dir.display()
                );
            }
            latest_session(&project_dir)?.ok_or_else(|| {
                anyhow::anyhow!("No sessions found in {}", project_dir.display())
            })
        }
    }
}

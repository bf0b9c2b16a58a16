//! Path resolution for Claude Code session transcripts

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Resolves standard paths under `~/.claude`
#[derive(Debug, Clone)]
pub struct Paths {
    pub home_claude: PathBuf,
}

/// A session transcript on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub id: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl Paths {
    /// Create a new Paths resolver rooted at the user's home directory
    pub fn new() -> std::io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::with_home(home))
    }

    /// Resolver rooted at an explicit home directory
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        Self {
            home_claude: home.as_ref().join(".claude"),
        }
    }

    /// Get the directory holding one subdirectory per project
    pub fn projects_dir(&self) -> PathBuf {
        self.home_claude.join("projects")
    }

    /// Get the project directory for a working directory
    pub fn project_dir_for(&self, cwd: &Path) -> PathBuf {
        self.projects_dir().join(encode_project_path(cwd))
    }

    /// Get the project directory for the current working directory
    pub fn project_dir(&self) -> std::io::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(self.project_dir_for(&cwd))
    }

    /// Get ccspy's own settings file
    pub fn settings_file(&self) -> PathBuf {
        self.home_claude.join("ccspy").join("config.json")
    }

    /// Locate a session by id in any project directory
    pub fn find_session(&self, session_id: &str) -> Option<PathBuf> {
        let entries = std::fs::read_dir(self.projects_dir()).ok()?;
        entries
            .flatten()
            .map(|entry| entry.path().join(format!("{}.jsonl", session_id)))
            .find(|candidate| candidate.is_file())
    }
}

/// Encode a project path the way Claude Code names its project directories
pub fn encode_project_path(path: &Path) -> String {
    path.to_string_lossy().replace(['/', '\\', '.'], "-")
}

/// Session transcripts in a project directory, newest first
///
/// Sub-agent logs (`agent-*.jsonl`) are not sessions and are skipped.
pub fn list_sessions(project_dir: &Path) -> std::io::Result<Vec<SessionFile>> {
    let mut sessions = Vec::new();

    for entry in std::fs::read_dir(project_dir)?.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") || !path.is_file() {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };
        if id.starts_with("agent-") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        sessions.push(SessionFile { id, path, modified });
    }

    sessions.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
    Ok(sessions)
}

/// Most recently modified session in a project directory
pub fn latest_session(project_dir: &Path) -> std::io::Result<Option<SessionFile>> {
    Ok(list_sessions(project_dir)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(path: &Path, age: Duration) {
        std::fs::write(path, "{}\n").unwrap();
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_paths_with_home() {
        let paths = Paths::with_home("/home/dev");
        assert!(paths.home_claude.ends_with(".claude"));
        assert_eq!(paths.projects_dir(), PathBuf::from("/home/dev/.claude/projects"));
        assert!(paths.settings_file().ends_with("ccspy/config.json"));
    }

    #[test]
    fn test_encode_project_path() {
        assert_eq!(
            encode_project_path(Path::new("/Users/dev/my.app")),
            "-Users-dev-my-app"
        );
    }

    #[test]
    fn test_project_dir_for() {
        let paths = Paths::with_home("/home/dev");
        let dir = paths.project_dir_for(Path::new("/work/crate"));
        assert!(dir.ends_with("projects/-work-crate"));
    }

    #[test]
    fn test_list_sessions_newest_first() {
        let temp = tempfile::TempDir::new().unwrap();
        touch(&temp.path().join("old.jsonl"), Duration::from_secs(3600));
        touch(&temp.path().join("new.jsonl"), Duration::from_secs(10));
        touch(&temp.path().join("agent-123.jsonl"), Duration::from_secs(1));
        touch(&temp.path().join("notes.txt"), Duration::from_secs(1));

        let sessions = list_sessions(temp.path()).unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let latest = latest_session(temp.path()).unwrap().unwrap();
        assert_eq!(latest.id, "new");
    }

    #[test]
    fn test_latest_session_empty_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(latest_session(temp.path()).unwrap().is_none());
        assert!(list_sessions(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_find_session() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_home(temp.path());
        let project = paths.projects_dir().join("-work-crate");
        std::fs::create_dir_all(&project).unwrap();
        touch(&project.join("abc.jsonl"), Duration::from_secs(1));

        assert_eq!(paths.find_session("abc"), Some(project.join("abc.jsonl")));
        assert_eq!(paths.find_session("zzz"), None);
    }
}

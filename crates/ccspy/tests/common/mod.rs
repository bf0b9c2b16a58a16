#![allow(dead_code)]

use ccspy_transcript::encode_project_path;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// A fake home directory and a working directory with its project folder
pub struct Fixture {
    pub home: TempDir,
    pub work: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.home
            .path()
            .join(".claude")
            .join("projects")
            .join(encode_project_path(self.work.path()))
    }

    pub fn write_session(&self, id: &str, lines: &[String]) -> PathBuf {
        let dir = self.project_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}.jsonl", id));
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn ccspy(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ccspy"))
            .args(args)
            .current_dir(self.work.path())
            .env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("OPENAI_API_KEY")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

pub fn user_line(text: &str) -> String {
    serde_json::json!({
        "type": "user",
        "timestamp": "2026-03-01T10:00:00Z",
        "message": {"role": "user", "content": text}
    })
    .to_string()
}

pub fn assistant_line(text: &str) -> String {
    serde_json::json!({
        "type": "assistant",
        "timestamp": "2026-03-01T10:00:05Z",
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    })
    .to_string()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

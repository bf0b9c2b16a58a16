use serde::{Deserialize, Serialize};
use std::fmt;

/// Which analysis to run over a conversation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Archer: intent summary and quality review
    Summary,
    /// Security review of what the assistant did
    Security,
}

impl AnalysisKind {
    pub fn title(self) -> &'static str {
        match self {
            AnalysisKind::Summary => "ARCHER SUMMARY",
            AnalysisKind::Security => "SECURITY ANALYSIS",
        }
    }

    /// Output cap sent with the request
    pub fn max_tokens(self) -> u32 {
        match self {
            AnalysisKind::Summary => 1000,
            AnalysisKind::Security => 1200,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Summary => write!(f, "Archer summary"),
            AnalysisKind::Security => write!(f, "security analysis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub input: serde_json::Value,
}

/// One user turn and the assistant output that followed it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user: String,
    pub assistant: String,
    pub tools: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    pub tokens_used: u64,
    pub model: String,
}

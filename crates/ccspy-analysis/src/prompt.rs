use crate::types::{AnalysisKind, Interaction};

const SUMMARY_SYSTEM_PROMPT: &str = "You are Archer, an AI conversation analyzer. \
Analyze the conversation between a developer and Claude Code (an AI coding assistant).

Your analysis should cover:
1. **Intent Summary**: What was the developer trying to accomplish?
2. **Security Tasks**: Any security-related tasks, implementations, or concerns identified?
3. **Potential Issues**: Any gaps, misunderstandings, or areas that could be improved?
4. **Overall Assessment**: Brief verdict on conversation quality and helpfulness.

Format with empty lines between sections. Be concise and pragmatic.";

const SECURITY_SYSTEM_PROMPT: &str = "You are a security expert analyzing Claude Code \
conversations. Evaluate the conversation for:
1. **Secure Implementations**: Identify proper security practices, secure coding patterns, and safe implementations.
2. **Security Bad Practices**: Flag any security anti-patterns, vulnerabilities, or risky behaviors \
(e.g., hardcoded credentials, insecure APIs, improper authentication, SQL injection risks, etc).
3. **Data Protection**: Assess handling of sensitive data, credentials, keys, and PII.
4. **Recommendations**: Suggest security improvements or best practices.

Be direct and specific. Use clear severity levels: CRITICAL, WARNING, INFO.";

pub fn system_prompt(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Summary => SUMMARY_SYSTEM_PROMPT,
        AnalysisKind::Security => SECURITY_SYSTEM_PROMPT,
    }
}

/// Render interactions as markdown sections separated by `---`
pub fn format_interactions(interactions: &[Interaction]) -> String {
    interactions
        .iter()
        .enumerate()
        .map(|(idx, interaction)| {
            let mut text = format!("\n## Interaction {}\n\n", idx + 1);
            text.push_str(&format!("**User Input:**\n{}\n\n", interaction.user));

            if !interaction.tools.is_empty() {
                text.push_str("**Tools Used:**\n");
                for tool in &interaction.tools {
                    let input = serde_json::to_string_pretty(&tool.input)
                        .unwrap_or_else(|_| tool.input.to_string());
                    text.push_str(&format!("- {}: {}\n", tool.name, input));
                }
                text.push('\n');
            }

            text.push_str(&format!("**Claude's Response:**\n{}\n", interaction.assistant));
            text
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// User message carrying the formatted conversation window
pub fn build_user_message(kind: AnalysisKind, interactions: &[Interaction]) -> String {
    let lead = match kind {
        AnalysisKind::Summary => "Analyze this conversation:",
        AnalysisKind::Security => "Analyze this conversation for security:",
    };
    format!("{}\n\n{}", lead, format_interactions(interactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    fn sample() -> Vec<Interaction> {
        vec![
            Interaction {
                user: "add login".to_string(),
                assistant: "Done.\n".to_string(),
                tools: vec![ToolCall {
                    name: "Edit".to_string(),
                    input: serde_json::json!({"file_path": "src/auth.rs"}),
                }],
            },
            Interaction {
                user: "thanks".to_string(),
                assistant: "Sure.\n".to_string(),
                tools: vec![],
            },
        ]
    }

    #[test]
    fn test_format_interactions() {
        let text = format_interactions(&sample());
        assert!(text.starts_with("\n## Interaction 1\n\n**User Input:**\nadd login"));
        assert!(text.contains("**Tools Used:**\n- Edit: {\n  \"file_path\": \"src/auth.rs\"\n}\n"));
        assert!(text.contains("\n---\n\n## Interaction 2"));
        assert_eq!(text.matches("**Tools Used:**").count(), 1);
        assert!(text.ends_with("**Claude's Response:**\nSure.\n\n"));
    }

    #[test]
    fn test_user_message_per_kind() {
        let summary = build_user_message(AnalysisKind::Summary, &sample());
        assert!(summary.starts_with("Analyze this conversation:\n\n"));
        let security = build_user_message(AnalysisKind::Security, &sample());
        assert!(security.starts_with("Analyze this conversation for security:\n\n"));
    }

    #[test]
    fn test_system_prompts_differ() {
        assert!(system_prompt(AnalysisKind::Summary).starts_with("You are Archer"));
        assert!(system_prompt(AnalysisKind::Security).contains("CRITICAL, WARNING, INFO"));
    }
}

//! Agent Profile
//!
//! The declarative part of the support agent: who it is, how it speaks, how
//! calls are recorded and what each stage tells the model to do. The hosting
//! runtime reads this once when it loads the agent.

use crate::workflow::{Action, Stage};
use serde::Serialize;
use std::collections::HashMap;

/// A titled block of the system prompt, either prose or a bullet list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptSection {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
}

impl PromptSection {
    pub fn text(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: Some(body.to_string()),
            bullets: vec![],
        }
    }

    pub fn bullets(title: &str, bullets: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            body: None,
            bullets: bullets.iter().map(|b| b.to_string()).collect(),
        }
    }

    /// Stable lookup key: the lowercased title with spaces as underscores.
    pub fn key(&self) -> String {
        self.title.to_lowercase().replace(' ', "_")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageProfile {
    pub name: String,
    pub code: String,
    pub voice: String,
    pub speech_fillers: Vec<String>,
    pub function_fillers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingProfile {
    pub record_call: bool,
    pub format: String,
    pub stereo: bool,
}

/// Per-stage instructions for the conversation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageProfile {
    pub stage: Stage,
    pub step_text: String,
    pub step_criteria: String,
    pub enter_fillers: Vec<String>,
    pub functions: Vec<Action>,
    pub valid_stages: Vec<Stage>,
}

impl StageProfile {
    fn new(stage: Stage, step_text: &str, step_criteria: &str, enter_fillers: &[&str]) -> Self {
        Self {
            stage,
            step_text: step_text.to_string(),
            step_criteria: step_criteria.to_string(),
            enter_fillers: enter_fillers.iter().map(|f| f.to_string()).collect(),
            functions: Action::ALL
                .into_iter()
                .filter(|action| stage.permits(*action))
                .collect(),
            valid_stages: stage.valid_next().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub name: String,
    pub route: String,
    pub prompt: Vec<PromptSection>,
    pub language: LanguageProfile,
    pub recording: RecordingProfile,
    pub stages: Vec<StageProfile>,
}

impl AgentProfile {
    /// Replaces the body of prompt sections whose key matches a supplied
    /// override. Unknown keys are appended as new prose sections, in key order.
    pub fn with_prompt_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        let mut extra: Vec<(&String, &String)> = Vec::new();
        for (key, body) in overrides {
            match self.prompt.iter_mut().find(|section| &section.key() == key) {
                Some(section) => {
                    section.body = Some(body.trim().to_string());
                    section.bullets.clear();
                }
                None => extra.push((key, body)),
            }
        }
        extra.sort();
        for (key, body) in extra {
            let title = key.replace('_', " ");
            self.prompt.push(PromptSection::text(&title, body.trim()));
        }
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageProfile> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Renders the prompt sections as markdown.
    pub fn render_prompt(&self) -> String {
        let mut out = String::new();
        for section in &self.prompt {
            out.push_str(&format!("## {}\n\n", section.title));
            if let Some(body) = &section.body {
                out.push_str(body);
                out.push_str("\n\n");
            }
            for bullet in &section.bullets {
                out.push_str(&format!("- {bullet}\n"));
            }
            if !section.bullets.is_empty() {
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "techsupport-agent".to_string(),
            route: "/support".to_string(),
            prompt: vec![
                PromptSection::text(
                    "Role",
                    "You are a technical support agent for TechSupport Pro. \
                     This call may be recorded for quality and training purposes.",
                ),
                PromptSection::bullets(
                    "Capabilities",
                    &[
                        "Identify customers by phone or email",
                        "Create and manage support tickets",
                        "Troubleshoot common issues",
                        "Escalate to specialists when needed",
                    ],
                ),
                PromptSection::text(
                    "Privacy",
                    "When collecting sensitive information like account numbers or \
                     passwords, always use secure_mode to pause recording first.",
                ),
                PromptSection::bullets(
                    "Guidelines",
                    &[
                        "Always verify the customer's identity first",
                        "Be professional and empathetic",
                        "Gather complete issue details before creating a ticket",
                        "Escalate to specialists when the issue requires expertise",
                    ],
                ),
            ],
            language: LanguageProfile {
                name: "English".to_string(),
                code: "en-US".to_string(),
                voice: "rime.spore".to_string(),
                speech_fillers: vec!["Um".to_string(), "Let me see".to_string()],
                function_fillers: vec![
                    "One moment please...".to_string(),
                    "Looking that up...".to_string(),
                ],
            },
            recording: RecordingProfile {
                record_call: true,
                format: "mp3".to_string(),
                stereo: true,
            },
            stages: vec![
                StageProfile::new(
                    Stage::Greeting,
                    "Welcome the customer to TechSupport Pro and tell them the call may be \
                     recorded. Ask for their email or phone number and use identify_customer \
                     to look them up.",
                    "Customer has been identified",
                    &[],
                ),
                StageProfile::new(
                    Stage::Triage,
                    "Collect details about the customer's issue. Use describe_issue and \
                     create_ticket to document the problem, and check_knowledge_base for \
                     known fixes.",
                    "Customer has described their issue and a ticket has been created",
                    &[
                        "Let me help you with your issue...",
                        "Now let's discuss what's going on...",
                    ],
                ),
                StageProfile::new(
                    Stage::Resolution,
                    "Work to resolve the issue or escalate if needed. Use resolve_ticket \
                     when fixed, escalate_ticket for specialists, or schedule_callback if \
                     the customer prefers to be called back.",
                    "Issue has been resolved or escalated",
                    &[
                        "Let me help resolve this issue...",
                        "Now let's work on a solution...",
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_stage_functions_follow_gating() {
        let profile = AgentProfile::default();

        let greeting = profile.stage(Stage::Greeting).unwrap();
        assert_eq!(
            greeting.functions,
            vec![
                Action::IdentifyCustomer,
                Action::GetStatus,
                Action::SecureMode,
                Action::EndSecureMode
            ]
        );
        assert_eq!(greeting.valid_stages, vec![Stage::Triage]);

        let resolution = profile.stage(Stage::Resolution).unwrap();
        assert!(resolution.functions.contains(&Action::EscalateTicket));
        assert!(!resolution.functions.contains(&Action::CreateTicket));
        assert_eq!(resolution.valid_stages, vec![Stage::Greeting]);
    }

    #[test]
    fn test_render_prompt() {
        let rendered = AgentProfile::default().render_prompt();

        assert!(rendered.starts_with("## Role\n\nYou are a technical support agent"));
        assert!(rendered.contains("## Capabilities\n\n- Identify customers by phone or email\n"));
        assert!(rendered.ends_with("- Escalate to specialists when the issue requires expertise"));
    }

    #[test]
    fn test_prompt_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("role".to_string(), "You are Ada, a support agent.\n".to_string());
        overrides.insert("opening_hours".to_string(), "Open 24/7.".to_string());

        let profile = AgentProfile::default().with_prompt_overrides(&overrides);

        let role = &profile.prompt[0];
        assert_eq!(role.body.as_deref(), Some("You are Ada, a support agent."));
        let last = profile.prompt.last().unwrap();
        assert_eq!(last.title, "opening hours");
        assert_eq!(last.body.as_deref(), Some("Open 24/7."));
        assert_eq!(profile.prompt.len(), 5);
    }

    #[test]
    fn test_profile_serialization() {
        let value = serde_json::to_value(AgentProfile::default()).unwrap();

        assert_eq!(value["name"], "techsupport-agent");
        assert_eq!(value["recording"]["format"], "mp3");
        assert_eq!(value["stages"][1]["stage"], "triage");
        assert_eq!(value["stages"][1]["functions"][0], "describe_issue");
        assert!(value["prompt"][0].get("bullets").is_none());
    }
}

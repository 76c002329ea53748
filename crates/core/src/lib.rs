pub mod actions;
pub mod agent;
pub mod directory;
pub mod knowledge;
pub mod profile;
pub mod registry;
pub mod session;
pub mod ticket;
pub mod workflow;

use serde::{Deserialize, Serialize};
use workflow::Stage;

/// Side effects the workflow asks the hosting runtime to carry out.
///
/// The core never performs these itself. They are returned alongside each
/// action's response so the voice runtime can send messages, control call
/// recording, transfer the call or move the conversation to another stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Send a text notification to the given number or address.
    SendNotification { to: String, body: String },
    /// Pause call recording while sensitive details are collected.
    PauseRecording,
    /// Resume call recording.
    ResumeRecording,
    /// Connect the caller to another party. A final transfer ends the
    /// agent's part in the call.
    Connect {
        to: String,
        #[serde(rename = "final")]
        final_transfer: bool,
    },
    /// Make the given stage the active one.
    SwitchStage { stage: Stage },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_wire_format() {
        let connect = Intent::Connect {
            to: "+15552222222".to_string(),
            final_transfer: true,
        };
        assert_eq!(
            serde_json::to_value(&connect).unwrap(),
            json!({"type": "connect", "to": "+15552222222", "final": true})
        );

        let switch = Intent::SwitchStage {
            stage: Stage::Triage,
        };
        assert_eq!(
            serde_json::to_value(&switch).unwrap(),
            json!({"type": "switch_stage", "stage": "triage"})
        );

        assert_eq!(
            serde_json::to_value(Intent::PauseRecording).unwrap(),
            json!({"type": "pause_recording"})
        );
    }
}

//! Voice command detection in audio transcriptions.
//!
//! Inspectors dictate while walking through a property ("mark sink as
//! damaged", "next room", "note: ..."). The commands are returned with the
//! transcription so a client can apply them.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceAction {
    SetStatus,
    NextRoom,
    AddNote,
}

/// One command found in a transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCommand {
    pub action: VoiceAction,
    /// Captured groups of each match, e.g. `["sink", "damaged"]`.
    pub matches: Vec<Vec<String>>,
}

static SET_STATUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"mark\s+(.+?)\s+as\s+(ok|damaged|dirty|missing)").unwrap(),
        Regex::new(r"marcar?\s+(.+?)\s+como\s+(ok|danificado|sujo|ausente)").unwrap(),
        Regex::new(r"(\w[\w\s]*?)\s+está\s+(ok|danificado|sujo|ausente)").unwrap(),
    ]
});

static NEXT_ROOM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"next\s+room").unwrap(),
        Regex::new(r"próximo\s+cômodo").unwrap(),
        Regex::new(r"próxima\s+sala").unwrap(),
        Regex::new(r"\bavançar\b").unwrap(),
    ]
});

static ADD_NOTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"note:\s*(.+)").unwrap(),
        Regex::new(r"observação:\s*(.+)").unwrap(),
        Regex::new(r"anotar:\s*(.+)").unwrap(),
        Regex::new(r"nota:\s*(.+)").unwrap(),
    ]
});

/// Scans a transcription for dictated commands.
///
/// Matching is case-insensitive. Each pattern that matches contributes one
/// command, so the same action can appear more than once.
pub fn detect_voice_commands(text: &str) -> Vec<VoiceCommand> {
    let lower = text.to_lowercase();
    let groups: [(VoiceAction, &[Regex]); 3] = [
        (VoiceAction::SetStatus, SET_STATUS_PATTERNS.as_slice()),
        (VoiceAction::NextRoom, NEXT_ROOM_PATTERNS.as_slice()),
        (VoiceAction::AddNote, ADD_NOTE_PATTERNS.as_slice()),
    ];

    let mut commands = Vec::new();
    for (action, patterns) in groups {
        for pattern in patterns {
            let matches: Vec<Vec<String>> = pattern
                .captures_iter(&lower)
                .map(|caps| {
                    caps.iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str().trim().to_string())
                        .collect()
                })
                .collect();
            if !matches.is_empty() {
                commands.push(VoiceCommand { action, matches });
            }
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_status_english() {
        let commands = detect_voice_commands("Mark kitchen sink as damaged please");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].action, VoiceAction::SetStatus);
        assert_eq!(
            commands[0].matches,
            vec![vec!["kitchen sink".to_string(), "damaged".to_string()]]
        );
    }

    #[test]
    fn test_set_status_portuguese() {
        let commands = detect_voice_commands("Marcar torneira como danificado");
        assert_eq!(commands[0].action, VoiceAction::SetStatus);
        assert_eq!(commands[0].matches[0][1], "danificado");
    }

    #[test]
    fn test_next_room_has_no_captures() {
        let commands = detect_voice_commands("ok, next room");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].action, VoiceAction::NextRoom);
        assert_eq!(commands[0].matches, vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_note_and_status_together() {
        let commands =
            detect_voice_commands("Mark door as dirty. Note: fingerprints near the handle");
        let actions: Vec<_> = commands.iter().map(|c| c.action).collect();
        assert_eq!(actions, vec![VoiceAction::SetStatus, VoiceAction::AddNote]);
        assert_eq!(
            commands[1].matches[0][0],
            "fingerprints near the handle".to_string()
        );
    }

    #[test]
    fn test_plain_text_has_no_commands() {
        assert!(detect_voice_commands("The living room walls were repainted").is_empty());
    }
}

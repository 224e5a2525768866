//! Inline nickname editor state.

use crate::domain::user::normalize_nickname;
use crate::ws::ClientCommand;

/// Outcome of committing the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicknameCommit {
    /// Command to send to the server.
    pub command: ClientCommand,
    /// Normalized nickname; empty when cleared, in which case the alias
    /// is shown.
    pub nickname: String,
}

/// Tracks whether the nickname label is being edited and what it showed
/// before editing started.
#[derive(Debug, Default)]
pub struct NicknameEditor {
    previous_label: Option<String>,
}

impl NicknameEditor {
    /// Creates an idle editor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous_label: None,
        }
    }

    /// Returns `true` while editing.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.previous_label.is_some()
    }

    /// Starts editing. Returns `false` if an edit is already open.
    pub fn begin(&mut self, current_label: &str) -> bool {
        if self.is_editing() {
            return false;
        }
        self.previous_label = Some(current_label.to_string());
        true
    }

    /// Saves `input` as the new nickname. Returns `None` when not editing.
    pub fn commit(&mut self, input: &str) -> Option<NicknameCommit> {
        self.previous_label.take()?;
        let nickname = normalize_nickname(input);
        Some(NicknameCommit {
            command: ClientCommand::SetNickname {
                nickname: nickname.clone(),
            },
            nickname,
        })
    }

    /// Abandons the edit and returns the label to restore.
    pub fn cancel(&mut self) -> Option<String> {
        self.previous_label.take()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn commit_trims_and_caps() {
        let mut editor = NicknameEditor::new();
        assert!(editor.begin("ab12cd34"));
        let Some(commit) = editor.commit("   a_really_long_nickname  ") else {
            panic!("commit should succeed while editing");
        };
        assert_eq!(commit.nickname, "a_really_lon");
        assert_eq!(
            commit.command,
            ClientCommand::SetNickname {
                nickname: "a_really_lon".to_string()
            }
        );
        assert!(!editor.is_editing());
    }

    #[test]
    fn blank_commit_clears_nickname() {
        let mut editor = NicknameEditor::new();
        editor.begin("neo");
        let Some(commit) = editor.commit("   ") else {
            panic!("commit should succeed while editing");
        };
        assert!(commit.nickname.is_empty());
        assert_eq!(
            commit.command,
            ClientCommand::SetNickname {
                nickname: String::new()
            }
        );
    }

    #[test]
    fn cancel_restores_previous_label() {
        let mut editor = NicknameEditor::new();
        assert!(editor.begin("neo"));
        assert!(!editor.begin("other"));
        assert_eq!(editor.cancel().as_deref(), Some("neo"));
        assert_eq!(editor.cancel(), None);
        assert!(editor.commit("x").is_none());
    }
}

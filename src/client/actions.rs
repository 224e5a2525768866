//! Per-message context menu actions.

use super::room_cache::CachedMessage;

/// Which actions the context menu offers for a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageActions {
    /// Own text messages can be edited.
    pub edit: bool,
    /// Own messages can be deleted.
    pub delete: bool,
    /// Text messages can be copied.
    pub copy: bool,
    /// Other people's text messages can be quoted.
    pub quote: bool,
}

impl MessageActions {
    /// Computes the actions for a message by ownership and kind.
    #[must_use]
    pub const fn for_message(own: bool, is_image: bool) -> Self {
        Self {
            edit: own && !is_image,
            delete: own,
            copy: !is_image,
            quote: !own && !is_image,
        }
    }

    /// Computes the actions for a cached message.
    #[must_use]
    pub const fn for_cached(message: &CachedMessage) -> Self {
        Self::for_message(message.own, message.is_image())
    }
}

/// Formats `text` as a quote to prefill the composer.
#[must_use]
pub fn quote_text(text: &str) -> String {
    format!("> {text}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_text_allows_edit_delete_copy() {
        let actions = MessageActions::for_message(true, false);
        assert!(actions.edit && actions.delete && actions.copy);
        assert!(!actions.quote);
    }

    #[test]
    fn own_image_only_deletes() {
        let actions = MessageActions::for_message(true, true);
        assert_eq!(
            actions,
            MessageActions {
                delete: true,
                ..MessageActions::default()
            }
        );
    }

    #[test]
    fn foreign_text_copies_and_quotes() {
        let actions = MessageActions::for_message(false, false);
        assert!(actions.copy && actions.quote);
        assert!(!actions.edit && !actions.delete);
    }

    #[test]
    fn foreign_image_has_no_actions() {
        assert_eq!(
            MessageActions::for_message(false, true),
            MessageActions::default()
        );
    }

    #[test]
    fn quote_prefixes_marker() {
        assert_eq!(quote_text("hello"), "> hello\n");
    }
}

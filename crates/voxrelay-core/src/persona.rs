//! Fixed persona and reply-style table.
//!
//! Pure, read-only configuration: the system prompt is assembled from these
//! constants rather than ad hoc strings at call sites.

use crate::protocol::ResponseStyle;

/// Opening line spoken when a client sends a `greeting` message.
pub const GREETING: &str = "Hi! I'm Nova, your voice assistant. Happy to connect with you \
     — feel free to ask me anything!";

/// Reply used when the language model call fails; the conversation never
/// hard-fails on generation errors.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble thinking right now. Can you try again?";

const PERSONA: &str = "You are Nova — a warm, curious voice assistant having a relaxed \
spoken conversation. You chat the way a friendly, knowledgeable person does on a phone \
call, not like a search engine.

ABSOLUTE RULES:
1. NEVER dump lists, bullet points, or document-style text
2. Speak naturally — casual, warm, human
3. Use contractions (I'm, don't, can't, that's)
4. Keep it SHORT — everything you say will be spoken aloud
5. React naturally: \"Oh nice!\", \"Honestly...\", \"So basically...\"
6. ONE topic at a time — don't info-dump";

impl ResponseStyle {
    /// Length guidance spliced into the system prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Concise => "1-2 sentences max. Quick and punchy.",
            Self::Conversational => "2-4 sentences. Natural and friendly, like having coffee.",
            Self::Detailed => "4-6 sentences. More context but still conversational.",
        }
    }
}

/// Build the full system prompt for a reply-generation call.
pub fn system_prompt(style: ResponseStyle) -> String {
    format!("{PERSONA}\n\nRESPONSE STYLE: {}", style.instruction())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_instructions_distinct() {
        assert_ne!(
            ResponseStyle::Concise.instruction(),
            ResponseStyle::Detailed.instruction()
        );
        assert!(ResponseStyle::Concise.instruction().contains("1-2"));
        assert!(ResponseStyle::Detailed.instruction().contains("4-6"));
    }

    #[test]
    fn test_system_prompt_contains_style() {
        let prompt = system_prompt(ResponseStyle::Concise);
        assert!(prompt.contains("RESPONSE STYLE"));
        assert!(prompt.contains("1-2 sentences"));
        assert!(prompt.contains("spoken aloud"));
    }

    #[test]
    fn test_default_style_is_conversational() {
        let prompt = system_prompt(ResponseStyle::default());
        assert!(prompt.contains("2-4 sentences"));
    }
}

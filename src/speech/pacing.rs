//! Text pacing for learner-friendly speech
//!
//! Providers read punctuation as pauses. Padding the text with extra pause
//! markers slows the perceived speech rate without touching provider speed
//! settings. Both transforms are pure functions of the input text.

/// How aggressively to pad text with pause markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Long pauses after sentences and commas, a marker between every word
    Slow,
    /// A single extra space after sentence and comma punctuation
    Light,
    /// Text sent unchanged
    Natural,
}

impl Pacing {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Pacing::Slow => add_natural_pauses(text),
            Pacing::Light => text
                .replace('.', ". ")
                .replace('?', "? ")
                .replace(',', ", "),
            Pacing::Natural => text.to_string(),
        }
    }
}

/// Slow pacing: `.` → `. . .`, `?` → `? . . .`, `,` → `, . `, then every
/// whitespace run (including the ones just inserted) → ` . `
pub fn add_natural_pauses(text: &str) -> String {
    let expanded = text
        .replace('.', ". . .")
        .replace('?', "? . . .")
        .replace(',', ", . ");

    let mut paced = String::with_capacity(expanded.len() * 2);
    let mut in_whitespace = false;
    for ch in expanded.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                paced.push_str(" . ");
                in_whitespace = true;
            }
        } else {
            paced.push(ch);
            in_whitespace = false;
        }
    }

    paced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_gets_sentence_final_markers() {
        assert_eq!(
            add_natural_pauses("Are you hauling perishable goods?"),
            "Are . you . hauling . perishable . goods? . . . . . ."
        );
    }

    #[test]
    fn test_comma_and_period() {
        assert_eq!(
            add_natural_pauses("About 30 minutes ago, I stopped at a rest area for lunch."),
            "About . 30 . minutes . ago, . . . I . stopped . at . a . rest . area . for . lunch. . . . ."
        );
    }

    #[test]
    fn test_whitespace_runs_collapse_to_one_marker() {
        assert_eq!(add_natural_pauses("Yes\t \n sir"), "Yes . sir");
    }

    #[test]
    fn test_deterministic() {
        let text = "Is your trailer properly sealed?";
        assert_eq!(add_natural_pauses(text), add_natural_pauses(text));
    }

    #[test]
    fn test_light_pacing() {
        assert_eq!(
            Pacing::Light.apply("Are you hauling perishable goods?"),
            "Are you hauling perishable goods? "
        );
        assert_eq!(Pacing::Light.apply("ago, I"), "ago,  I");
    }

    #[test]
    fn test_natural_pacing_is_identity() {
        assert_eq!(Pacing::Natural.apply("What are you hauling?"), "What are you hauling?");
    }
}

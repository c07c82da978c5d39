use crate::history::Turn;

/// Theme injected when the client does not supply one.
pub const DEFAULT_THEME: &str = "default";

/// Render the transcript into the flat prompt sent to every backend.
///
/// The layout is one theme line followed by one line per turn:
///
/// ```text
/// Theme: <theme>
/// User: <content>
/// Assistant: <content>
/// ```
///
/// Every line ends with a newline, including the last one. The same
/// transcript and theme always produce the same prompt.
pub fn build_prompt(theme: &str, turns: &[Turn]) -> String {
    let theme = if theme.is_empty() { DEFAULT_THEME } else { theme };
    let mut prompt = format!("Theme: {}\n", theme);
    for turn in turns {
        prompt.push_str(&format!("{}: {}\n", turn.role.capitalized(), turn.content));
    }
    prompt
}

use lazy_static::lazy_static;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const FALLBACK_THEME: &str = "base16-ocean.dark";

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

/// Highlight JSON for a 24-bit terminal. Unknown themes fall back to the
/// default one; if highlighting fails the text is returned unchanged.
pub fn highlight_json(code: &str, theme: &str) -> String {
    let syntax = SYNTAX_SET
        .find_syntax_by_extension("json")
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let Some(theme) = THEME_SET
        .themes
        .get(theme)
        .or_else(|| THEME_SET.themes.get(FALLBACK_THEME))
    else {
        return code.to_string();
    };
    let mut h = HighlightLines::new(syntax, theme);

    let mut highlighted = String::new();
    for line in LinesWithEndings::from(code) {
        let Ok(ranges) = h.highlight_line(line, &SYNTAX_SET) else {
            return code.to_string();
        };
        highlighted.push_str(&syntect::util::as_24_bit_terminal_escaped(&ranges, true));
    }
    highlighted.push_str("\x1b[0m");
    highlighted
}

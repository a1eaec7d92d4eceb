//! Markup stripping for user-supplied text

use regex::Regex;
use std::sync::LazyLock;

/// Elements whose content is dropped along with the tags.
static EXECUTABLE_ELEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<(script|style|iframe|object|embed|noscript|template)\b[^>]*>.*?</(script|style|iframe|object|embed|noscript|template)\s*>",
    )
    .expect("static regex")
});

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));

/// A tag starts with `<` followed by a name, `/`, `!` or `?`; "3 < 5" is text.
static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z/!?][^>]*>").expect("static regex"));

/// Strip every markup tag from `input`, returning plain text.
///
/// Script-bearing elements lose their content too. Any `<` or `>` left over
/// cannot start a tag, and is escaped so the result stays inert when rendered.
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_input(input: &str) -> String {
    let without_exec = EXECUTABLE_ELEMENTS.replace_all(input, "");
    let without_comments = COMMENTS.replace_all(&without_exec, "");
    let text = TAGS.replace_all(&without_comments, "");
    text.replace('<', "&lt;").replace('>', "&gt;")
}

//! Telegram HTML Rendering
//!
//! The content catalogue is authored with lightweight markdown
//! (`**bold**`, `*italic*`, `~~strike~~`); Telegram wants HTML parse mode.

/// Render catalogue markdown to Telegram-safe HTML
pub fn render_html(text: &str) -> String {
    let escaped = escape_html(text);
    // `**` must go before `*` so bold markers are consumed first
    let bold = wrap_pairs(&escaped, "**", "<b>", "</b>");
    let struck = wrap_pairs(&bold, "~~", "<s>", "</s>");
    wrap_pairs(&struck, "*", "<i>", "</i>")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replace paired occurrences of `delim` with open/close tags; an unmatched
/// trailing delimiter stays literal
fn wrap_pairs(input: &str, delim: &str, open: &str, close: &str) -> String {
    let total = input.matches(delim).count();
    let usable = total - (total % 2);

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut seen = 0;
    let mut inside = false;

    while let Some(idx) = rest.find(delim) {
        out.push_str(&rest[..idx]);
        seen += 1;
        if seen <= usable {
            out.push_str(if inside { close } else { open });
            inside = !inside;
        } else {
            out.push_str(delim);
        }
        rest = &rest[idx + delim.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            render_html("a **bold** and *soft* word"),
            "a <b>bold</b> and <i>soft</i> word"
        );
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(render_html("~~gone~~"), "<s>gone</s>");
    }

    #[test]
    fn test_escapes_html() {
        assert_eq!(render_html("1 < 2 & 3 > 2"), "1 &lt; 2 &amp; 3 &gt; 2");
    }

    #[test]
    fn test_unmatched_marker_stays_literal() {
        assert_eq!(render_html("5 * 3 = 15"), "5 * 3 = 15");
        assert_eq!(render_html("**bold** then * alone"), "<b>bold</b> then * alone");
    }
}

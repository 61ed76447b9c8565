//! Text helpers for Telegram's HTML parse mode.

/// Escape text for use inside an HTML message.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap already-formatted markup in bold.
pub fn bold(markup: &str) -> String {
    format!("<b>{markup}</b>")
}

/// Build a link around plain `text` pointing at `href`.
pub fn link(text: &str, href: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(href), escape(text))
}

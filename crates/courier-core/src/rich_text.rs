//! Rich-text markup for chat messages.
//!
//! Formatters decide which text is bold, fixed-width or linked; a
//! [`RichText`] implementation decides how that looks on the wire.

/// Markup capability injected into formatters.
///
/// Methods taking plain text escape it. [`link`](RichText::link) takes a label
/// that is already markup so styled text can be linked.
pub trait RichText: Send + Sync {
    /// Escape plain text for inclusion in markup.
    fn escape(&self, text: &str) -> String;

    fn bold(&self, text: &str) -> String;

    /// Fixed-width (code) text.
    fn fixed(&self, text: &str) -> String;

    /// Link already rendered markup to `url`.
    fn link(&self, label_markup: &str, url: &str) -> String;

    /// Link plain text to `url`.
    fn link_text(&self, text: &str, url: &str) -> String {
        self.link(&self.escape(text), url)
    }
}

/// HTML markup as accepted by chat platforms (`<b>`, `<code>`, `<a>`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRichText;

impl RichText for HtmlRichText {
    fn escape(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                other => escaped.push(other),
            }
        }
        escaped
    }

    fn bold(&self, text: &str) -> String {
        format!("<b>{}</b>", self.escape(text))
    }

    fn fixed(&self, text: &str) -> String {
        format!("<code>{}</code>", self.escape(text))
    }

    fn link(&self, label_markup: &str, url: &str) -> String {
        let href = self.escape(url).replace('"', "&quot;");
        format!("<a href=\"{}\">{}</a>", href, label_markup)
    }
}

#[cfg(test)]
#[path = "rich_text_tests.rs"]
mod tests;

use super::*;

#[test]
fn test_escape_html_specials() {
    assert_eq!(HtmlRichText.escape("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    assert_eq!(HtmlRichText.escape("plain"), "plain");
}

#[test]
fn test_bold_and_fixed_escape_content() {
    assert_eq!(HtmlRichText.bold("Bob <bob>"), "<b>Bob &lt;bob&gt;</b>");
    assert_eq!(HtmlRichText.fixed("https://x/?a=1&b=2"), "<code>https://x/?a=1&amp;b=2</code>");
}

#[test]
fn test_link_keeps_label_markup() {
    let label = HtmlRichText.bold("Bob");

    assert_eq!(
        HtmlRichText.link(&label, "https://github.com/bob"),
        "<a href=\"https://github.com/bob\"><b>Bob</b></a>"
    );
}

#[test]
fn test_link_text_escapes_label_and_href() {
    assert_eq!(
        HtmlRichText.link_text("fix <b>", "https://x/?q=\"1\"&r=2"),
        "<a href=\"https://x/?q=&quot;1&quot;&amp;r=2\">fix &lt;b&gt;</a>"
    );
}

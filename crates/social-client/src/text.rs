use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Flatten 4chan comment HTML into plain text.
///
/// Line breaks become newlines, every other tag is dropped, and the handful
/// of entities the board API emits are decoded. `&amp;` is decoded last so
/// escaped entities such as `&amp;gt;` survive as literal text.
pub fn clean_html(text: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(text, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    stripped
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

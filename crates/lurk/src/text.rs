//! String helpers.

/// Escape text for inclusion in HTML, including attribute values.
pub fn html_encode(html: &str) -> String {
    let mut encoded = String::with_capacity(html.len());
    for c in html.chars() {
        match c {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#39;"),
            '/' => encoded.push_str("&#x2F;"),
            c => encoded.push(c),
        }
    }
    encoded
}

pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_markup() {
        assert_eq!(
            html_encode(r#"<a href="/x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;&#x2F;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn capitalizes() {
        assert_eq!(capitalize_first_letter("hello world"), "Hello world");
        assert_eq!(capitalize_first_letter("ßig"), "SSig");
        assert_eq!(capitalize_first_letter(""), "");
    }
}

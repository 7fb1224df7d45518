//! HTML-to-text stripper for email bodies.
//!
//! Transaction emails are mostly table-heavy HTML. The stripper keeps the
//! line-oriented structure (table rows → lines, cells → ` | `, list items
//! → `• `) so amounts and their labels stay adjacent, and is idempotent:
//! stripping already-stripped text is a no-op.

use regex::Regex;

pub struct HtmlStripper {
    comments: Regex,
    dead_elements: Regex,
    void_elements: Regex,
    media_blocks: Regex,
    css_props: Regex,
    css_braces: Regex,
    breaks: Regex,
    cells: Regex,
    items: Regex,
    tags: Regex,
    urls: Regex,
    entity: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

impl HtmlStripper {
    pub fn new() -> Self {
        Self {
            comments: Regex::new(r"(?s)<!--.*?-->").unwrap(),
            dead_elements: Regex::new(
                r"(?is)<style[^>]*>.*?</style>|<script[^>]*>.*?</script>|<head[^>]*>.*?</head>|<title[^>]*>.*?</title>",
            )
            .unwrap(),
            void_elements: Regex::new(r"(?i)<meta[^>]*>|<img[^>]*>|<link[^>]*>").unwrap(),
            media_blocks: Regex::new(
                r"(?s)@(?:media|font-face)[^{]*\{(?:[^{}]*\{[^}]*\})*[^}]*\}",
            )
            .unwrap(),
            css_props: Regex::new(r"(?m)^[ \t]*[a-zA-Z-]+\s*:\s*[^;{}\n]+;\s*$").unwrap(),
            css_braces: Regex::new(r"\{[^{}]*\}").unwrap(),
            breaks: Regex::new(r"(?i)<br\s*/?>|</?p[^>]*>|</?div[^>]*>|</?tr[^>]*>").unwrap(),
            cells: Regex::new(r"(?i)</?t[dh][^>]*>").unwrap(),
            items: Regex::new(r"(?i)</?li[^>]*>").unwrap(),
            tags: Regex::new(r"<[^>]+>").unwrap(),
            urls: Regex::new(r#"https?://[^\s"'<>]+"#).unwrap(),
            entity: Regex::new(r"&(#x?[0-9a-fA-F]+|[a-zA-Z]+);").unwrap(),
            spaces: Regex::new(r"[ \t]+").unwrap(),
            blank_lines: Regex::new(r"\n\s*\n\s*\n+").unwrap(),
        }
    }

    /// Strip an HTML fragment to flat text.
    pub fn strip(&self, html: &str) -> String {
        let text = self.comments.replace_all(html, "");
        let text = self.dead_elements.replace_all(&text, "");
        let text = self.void_elements.replace_all(&text, "");

        // CSS that leaked outside <style> (inlined media queries, stray
        // property declarations).
        let text = self.media_blocks.replace_all(&text, "");
        let text = self.css_props.replace_all(&text, "");
        let text = self.css_braces.replace_all(&text, "");

        // Block-level separators before tags are dropped wholesale.
        let text = self.breaks.replace_all(&text, "\n");
        let text = self.cells.replace_all(&text, " | ");
        let text = self.items.replace_all(&text, "\n\u{2022} ");
        let text = self.tags.replace_all(&text, " ");

        let text = self.unescape_entities(&text);

        // Keep a placeholder rather than deleting — amounts and merchant
        // names often sit right next to a tracking link.
        let text = self.urls.replace_all(&text, "[link]");

        let text = self.spaces.replace_all(&text, " ");
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| line.is_empty() || line.chars().any(char::is_alphanumeric))
            .collect();
        let text = lines.join("\n");
        let text = self.blank_lines.replace_all(&text, "\n\n");
        text.trim().to_string()
    }

    /// Decode HTML entities: the common named set plus numeric forms.
    fn unescape_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &regex::Captures| {
                let name = &caps[1];
                match name {
                    "amp" => "&".to_string(),
                    "lt" => "<".to_string(),
                    "gt" => ">".to_string(),
                    "quot" => "\"".to_string(),
                    "apos" => "'".to_string(),
                    "nbsp" => " ".to_string(),
                    "rsquo" | "lsquo" => "'".to_string(),
                    "ldquo" | "rdquo" => "\"".to_string(),
                    "ndash" => "\u{2013}".to_string(),
                    "mdash" => "\u{2014}".to_string(),
                    "bull" => "\u{2022}".to_string(),
                    _ => {
                        let code = if let Some(hex) = name
                            .strip_prefix("#x")
                            .or_else(|| name.strip_prefix("#X"))
                        {
                            u32::from_str_radix(hex, 16).ok()
                        } else if let Some(dec) = name.strip_prefix('#') {
                            dec.parse().ok()
                        } else {
                            None
                        };
                        match code.and_then(char::from_u32) {
                            Some(c) => c.to_string(),
                            // Unknown entity — leave it alone.
                            None => caps[0].to_string(),
                        }
                    }
                }
            })
            .into_owned()
    }
}

impl Default for HtmlStripper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripper() -> HtmlStripper {
        HtmlStripper::new()
    }

    #[test]
    fn strips_basic_tags() {
        assert_eq!(stripper().strip("<p>Hello</p>"), "Hello");
        assert_eq!(
            stripper().strip("<div><b>Bold</b> and <i>italic</i></div>"),
            "Bold and italic"
        );
    }

    #[test]
    fn removes_style_and_script_content() {
        let html = "<style>.x{color:red}</style><script>alert(1)</script><p>Rs.500 debited</p>";
        assert_eq!(stripper().strip(html), "Rs.500 debited");
    }

    #[test]
    fn removes_head_block() {
        let html = "<head><title>Alert</title><meta charset=\"utf-8\"></head><p>Body text</p>";
        assert_eq!(stripper().strip(html), "Body text");
    }

    #[test]
    fn removes_leaked_media_query() {
        let html = "@media screen and (max-width: 600px) { .body { width: 100% } }\nAmount Rs.99";
        assert_eq!(stripper().strip(html), "Amount Rs.99");
    }

    #[test]
    fn table_rows_become_lines_cells_become_separators() {
        let html = "<table><tr><td>Amount</td><td>Rs.500</td></tr><tr><td>Merchant</td><td>Swiggy</td></tr></table>";
        let text = stripper().strip(html);
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Amount") && lines[0].contains("Rs.500"));
        assert!(lines[1].contains("Merchant") && lines[1].contains("Swiggy"));
    }

    #[test]
    fn list_items_become_bullets() {
        let html = "<ul><li>First</li><li>Second</li></ul>";
        let text = stripper().strip(html);
        assert!(text.contains("\u{2022} First"));
        assert!(text.contains("\u{2022} Second"));
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(stripper().strip("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(stripper().strip("&#8377;500 paid"), "\u{20b9}500 paid");
        assert_eq!(stripper().strip("&#x20B9;500"), "\u{20b9}500");
    }

    #[test]
    fn unknown_entity_left_alone() {
        assert_eq!(stripper().strip("a &bogus; b"), "a &bogus; b");
    }

    #[test]
    fn urls_replaced_with_placeholder_not_deleted() {
        let html = r#"Paid Rs.210 <a href="https://pay.example.com/r/abc123">to Netplay</a>"#;
        let text = stripper().strip(html);
        assert!(text.contains("Paid Rs.210"));
        assert!(text.contains("to Netplay"));
        assert!(!text.contains("https://"));
    }

    #[test]
    fn drops_punctuation_noise_lines() {
        let text = stripper().strip("Rs.500 debited<br>| | |<br>---<br>done");
        assert!(text.contains("Rs.500 debited"));
        assert!(text.contains("done"));
        assert!(!text.lines().any(|l| l.trim() == "| | |"));
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(stripper().strip("No HTML here"), "No HTML here");
        assert_eq!(stripper().strip(""), "");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "<table><tr><td>Amount</td><td>Rs.1,500.00</td></tr></table>",
            "<p>Tom &amp; Jerry paid &#8377;99 at <a href='https://x.y/z'>shop</a></p>",
            "<ul><li>debited Rs.50</li></ul><style>p{x:y}</style>",
            "plain text with Rs.20 | inline pipe",
        ];
        let s = stripper();
        for html in samples {
            let once = s.strip(html);
            let twice = s.strip(&once);
            assert_eq!(once, twice, "not idempotent for {html:?}");
        }
    }
}

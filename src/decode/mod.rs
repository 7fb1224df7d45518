//! Email body decoding — turns a raw payload tree into clean flat text.
//!
//! Never fails: base64 damage, missing parts, and unknown MIME types all
//! degrade to best-effort (possibly empty) text that downstream stages
//! must tolerate.

pub mod html;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use regex::Regex;
use tracing::debug;

use crate::mail::Payload;

pub use html::HtmlStripper;

pub struct BodyDecoder {
    stripper: HtmlStripper,
    original_message: Regex,
    client_signatures: Regex,
    footers: Regex,
    media_blocks: Regex,
    css_props: Regex,
    urls: Regex,
    pipe_runs: Regex,
    edge_pipes: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

impl BodyDecoder {
    pub fn new() -> Self {
        Self {
            stripper: HtmlStripper::new(),
            original_message: Regex::new(r"(?s)-{2,}\s*Original Message\s*-{2,}.*$").unwrap(),
            client_signatures: Regex::new(
                r"(?s)(?:Sent from my (?:iPhone|iPad|Samsung|Android)|Get Outlook for (?:iOS|Android)).*$",
            )
            .unwrap(),
            footers: Regex::new(
                r"(?is)\n\s*(?:This is an automated (?:message|e?mail).*?do not reply.*|Unsubscribe\s*\|.*)$",
            )
            .unwrap(),
            media_blocks: Regex::new(
                r"(?s)@(?:media|font-face)[^{]*\{(?:[^{}]*\{[^}]*\})*[^}]*\}",
            )
            .unwrap(),
            css_props: Regex::new(r"(?m)^[ \t]*[a-zA-Z-]+\s*:\s*[^;{}\n]+;\s*$").unwrap(),
            urls: Regex::new(r#"https?://[^\s"'<>]+"#).unwrap(),
            pipe_runs: Regex::new(r"(\|\s*){2,}").unwrap(),
            edge_pipes: Regex::new(r"(?m)^\s*\|\s*|\s*\|\s*$").unwrap(),
            spaces: Regex::new(r"[ \t]+").unwrap(),
            blank_lines: Regex::new(r"\n\s*\n\s*\n+").unwrap(),
        }
    }

    /// Decode a payload tree to clean flat text.
    pub fn decode(&self, payload: &Payload) -> String {
        let mut body = String::new();
        self.collect(payload, &mut body);
        self.cleanup(&body)
    }

    fn collect(&self, part: &Payload, out: &mut String) {
        // Multipart container — recurse, including nested multipart/alternative.
        if !part.parts.is_empty() {
            for child in &part.parts {
                self.collect(child, out);
            }
            return;
        }

        let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) else {
            return;
        };
        if data.is_empty() {
            return;
        }

        let decoded = decode_base64url(data);
        let mime = part.mime_type.as_deref().unwrap_or("text/plain");
        if mime.eq_ignore_ascii_case("text/html") {
            out.push_str(&self.stripper.strip(&decoded));
        } else {
            out.push_str(&decoded);
        }
        out.push('\n');
    }

    /// Final cleanup over the assembled text: client boilerplate, CSS and
    /// table artifacts that survived stripping, whitespace normalization.
    fn cleanup(&self, body: &str) -> String {
        if body.is_empty() {
            return String::new();
        }

        let text = self.original_message.replace(body, "");
        let text = self.client_signatures.replace(&text, "");
        let text = self.footers.replace(&text, "");
        let text = self.media_blocks.replace_all(&text, "");
        let text = self.css_props.replace_all(&text, "");
        // Plain-text parts bypass the HTML stripper, so links get the same
        // placeholder treatment here.
        let text = self.urls.replace_all(&text, "[link]");
        let text = self.pipe_runs.replace_all(&text, "| ");
        let text = self.edge_pipes.replace_all(&text, "");
        let text = self.spaces.replace_all(&text, " ");
        let text: String = text
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        let text = self.blank_lines.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

impl Default for BodyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a base64url string with the provider's quirks: URL-safe alphabet,
/// padding often missing, and fields that are sometimes *already* decoded
/// upstream. Failures return the input unchanged.
pub fn decode_base64url(data: &str) -> String {
    // Already-decoded heuristics: markup, or characters outside the
    // base64url alphabet (spaces, punctuation), mean decoding again would
    // shred real text.
    if data.contains('<') && data.contains('>') {
        return data.to_string();
    }
    if !data.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '/' | '=' | '\r' | '\n')
    }) {
        return data.to_string();
    }

    // Repair standard-alphabet leakage and drop padding; URL_SAFE_NO_PAD
    // handles the rest.
    let repaired: String = data
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '='))
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    match URL_SAFE_NO_PAD.decode(&repaired) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(error = %e, "base64 decode failed, keeping raw text");
            data.to_string()
        }
    }
}

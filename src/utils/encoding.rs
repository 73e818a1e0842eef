// src/utils/encoding.rs

//! Page decoding for sites that still serve Shift_JIS or EUC-JP.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

/// `charset=...` inside a Content-Type value or a `<meta>` tag.
static CHARSET_PARAM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#).ok());

/// A `<meta>` tag carrying a charset, either form.
static META_CHARSET: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#).ok()
});

/// Bytes of the page head scanned for a `<meta>` charset.
const SNIFF_LEN: usize = 1024;

fn charset_label<'t>(re: &Option<Regex>, text: &'t str) -> Option<&'t str> {
    re.as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Pick the page encoding: Content-Type header, then `<meta>`, then UTF-8.
pub fn detect_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = content_type
        .and_then(|ct| charset_label(&CHARSET_PARAM, ct))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_LEN)]);
    charset_label(&META_CHARSET, &head)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decode a page body to UTF-8, replacing malformed sequences.
pub fn decode_page(content_type: Option<&str>, body: &[u8]) -> String {
    let encoding = detect_encoding(content_type, body);
    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        log::debug!("malformed {} sequences replaced", used.name());
    }
    text.into_owned()
}

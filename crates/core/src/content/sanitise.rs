//! HTML escaping and inline sanitisation for rendered lesson content.
//!
//! Lesson markup is injected into the page as raw HTML, so every piece of author-supplied text
//! passes through this module before it reaches the output:
//!
//! - [`escape_html`] escapes text that must never contain markup (code, attribute values).
//! - [`sanitise_inline`] keeps a small allow-list of inline formatting tags produced by the
//!   block editor (bold, italic, links, ...) and drops every other tag.
//! - [`plain_text`] drops all tags, for places like `alt` attributes.
//! - [`safe_url`] rejects URLs with schemes that can execute script (`javascript:`, `data:`, ...).
//!
//! Output of [`sanitise_inline`] is always tag-balanced, so an unclosed `<b>` in one block
//! cannot bleed into the next.

/// Inline tags that survive sanitisation. `a` additionally keeps a vetted `href`.
const ALLOWED_INLINE_TAGS: &[&str] = &[
    "a", "b", "br", "code", "em", "i", "mark", "s", "strong", "sub", "sup", "u",
];

/// Tags that never have content or a closing tag.
const VOID_TAGS: &[&str] = &["br"];

/// Opening tags past this nesting depth are dropped.
const MAX_INLINE_DEPTH: usize = 64;

/// Longest tag, in bytes, that is still parsed as markup.
const MAX_TAG_LEN: usize = 4096;

/// `&` plus the longest named, decimal or hex reference body plus `;`.
const MAX_ENTITY_LEN: usize = 34;

/// What a URL will be used for, which decides the schemes it may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPolicy {
    /// `img src`, `iframe src`: `http`, `https` or relative.
    Media,
    /// `a href`: additionally `mailto` and `tel`.
    Link,
}

impl UrlPolicy {
    fn allows_scheme(self, scheme: &str) -> bool {
        match self {
            UrlPolicy::Media => matches!(scheme, "http" | "https"),
            UrlPolicy::Link => matches!(scheme, "http" | "https" | "mailto" | "tel"),
        }
    }
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        c => out.push(c),
    }
}

/// Sanitises editor rich text, keeping allow-listed inline tags.
pub fn sanitise_inline(input: &str) -> String {
    sanitise(input, true)
}

/// Strips every tag and escapes the remaining text.
pub fn plain_text(input: &str) -> String {
    sanitise(input, false)
}

/// Returns the trimmed URL if it is safe to embed under `policy`.
///
/// Relative URLs (including root-relative and protocol-relative) are allowed; absolute URLs
/// must use a scheme from the policy. Control characters and whitespace inside the URL are
/// rejected outright, since browsers strip them before scheme detection (`java\tscript:`).
pub fn safe_url(url: &str, policy: UrlPolicy) -> Option<String> {
    let url = url.trim();
    if url.is_empty() || url.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return None;
    }

    let scheme_end = url.find([':', '/', '?', '#']);
    match scheme_end {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            policy.allows_scheme(&scheme).then(|| url.to_string())
        }
        _ => Some(url.to_string()),
    }
}

/// Whether `url` is a path on the current origin (`/img/a.png`).
///
/// `//host` and `/\\host` are protocol-relative: browsers read `\\` as `/`.
pub fn is_root_relative(url: &str) -> bool {
    url.starts_with('/') && !matches!(url.as_bytes().get(1), Some(b'/' | b'\\'))
}

fn sanitise(input: &str, keep_tags: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut open: Vec<&'static str> = Vec::new();
    let mut rest = input;

    while let Some(pos) = rest.find(['<', '>', '&', '"', '\'']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match tail.as_bytes()[0] {
            b'<' => match parse_tag(tail) {
                Some((tag, consumed)) => {
                    if keep_tags {
                        emit_tag(&tag, &mut open, &mut out);
                    }
                    rest = &tail[consumed..];
                    continue;
                }
                None => out.push_str("&lt;"),
            },
            b'&' => {
                if let Some(len) = entity_len(tail) {
                    out.push_str(&tail[..len]);
                    rest = &tail[len..];
                    continue;
                }
                out.push_str("&amp;");
            }
            b'>' => out.push_str("&gt;"),
            b'"' => out.push_str("&quot;"),
            _ => out.push_str("&#39;"),
        }
        rest = &tail[1..];
    }
    out.push_str(rest);

    while let Some(name) = open.pop() {
        out.push_str(&format!("</{}>", name));
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
struct Tag {
    /// Lowercased tag name; `None` when the tag is not allow-listed.
    name: Option<&'static str>,
    closing: bool,
    self_closing: bool,
    href: Option<String>,
}

fn emit_tag(tag: &Tag, open: &mut Vec<&'static str>, out: &mut String) {
    let Some(name) = tag.name else {
        return;
    };

    if VOID_TAGS.contains(&name) {
        if !tag.closing {
            out.push_str(&format!("<{} />", name));
        }
        return;
    }

    if tag.closing {
        // Close everything opened after the matching tag; ignore stray closers.
        if let Some(idx) = open.iter().rposition(|n| *n == name) {
            while open.len() > idx {
                if let Some(n) = open.pop() {
                    out.push_str(&format!("</{}>", n));
                }
            }
        }
        return;
    }

    if tag.self_closing || open.len() >= MAX_INLINE_DEPTH {
        return;
    }

    match (name, &tag.href) {
        ("a", Some(href)) => out.push_str(&format!(
            r#"<a href="{}" rel="noopener noreferrer" target="_blank">"#,
            escape_html(href)
        )),
        _ => out.push_str(&format!("<{}>", name)),
    }
    open.push(name);
}

/// Parses a tag at the start of `tail` (which begins with `<`).
///
/// Returns `None` when the text is not tag-shaped (`a < b`, `<3`, `<!-- -->`), in which case
/// the `<` is escaped by the caller.
fn parse_tag(tail: &str) -> Option<(Tag, usize)> {
    let end = tag_end(tail)?;
    let inner = &tail[1..end];

    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };

    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || !body.as_bytes()[0].is_ascii_alphabetic() {
        return None;
    }
    let raw_name = body[..name_len].to_ascii_lowercase();
    let attrs = &body[name_len..];
    if !attrs.is_empty() && !attrs.starts_with(|c: char| c.is_ascii_whitespace() || c == '/') {
        return None;
    }

    let name = ALLOWED_INLINE_TAGS
        .iter()
        .copied()
        .find(|allowed| *allowed == raw_name);
    let self_closing = attrs.trim_end().ends_with('/');

    let href = match name {
        Some("a") if !closing => parse_attrs(attrs)
            .into_iter()
            .find(|(k, _)| k == "href")
            .and_then(|(_, v)| decode_attr(&v))
            .and_then(|v| safe_url(&v, UrlPolicy::Link)),
        _ => None,
    };

    Some((
        Tag {
            name,
            closing,
            self_closing,
            href,
        },
        end + 1,
    ))
}

/// Index of the `>` closing the tag at the start of `tail`, honouring quoted attribute values.
fn tag_end(tail: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in tail.bytes().enumerate().take(MAX_TAG_LEN).skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                b'<' => return None,
                _ => {}
            },
        }
    }
    None
}

fn parse_attrs(input: &str) -> Vec<(String, String)> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b'/') && !bytes[i].is_ascii_whitespace()
        {
            i += 1;
        }
        if name_start == i {
            break;
        }
        let name = input[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            attrs.push((name, String::new()));
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let start = i + 1;
                let len = input[start..].find(q as char).unwrap_or(input.len() - start);
                i = (start + len + 1).min(bytes.len());
                &input[start..start + len]
            }
            _ => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &input[start..i]
            }
        };
        attrs.push((name, value.to_string()));
    }

    attrs
}

/// Length of a well-formed character reference at the start of `tail`, if any.
fn entity_len(tail: &str) -> Option<usize> {
    let bytes = tail.as_bytes();
    let window = &bytes[1..bytes.len().min(MAX_ENTITY_LEN)];
    let semi = window.iter().position(|&b| b == b';')? + 1;
    let body = &bytes[1..semi];

    let ok = match body {
        [b'#', b'x' | b'X', hex @ ..] => {
            (1..=6).contains(&hex.len()) && hex.iter().all(u8::is_ascii_hexdigit)
        }
        [b'#', dec @ ..] => (1..=7).contains(&dec.len()) && dec.iter().all(u8::is_ascii_digit),
        [first, named @ ..] => {
            first.is_ascii_alphabetic()
                && named.len() < 32
                && named.iter().all(u8::is_ascii_alphanumeric)
        }
        [] => false,
    };

    ok.then_some(semi + 1)
}

/// Decodes character references in an attribute value before it is vetted.
///
/// Returns `None` for references this decoder does not understand. An unknown reference
/// might spell out part of a scheme, so the value is rejected.
fn decode_attr(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some(len) = entity_len(tail) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };

        let body = &tail[1..len - 1];
        let decoded = match body {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "colon" => Some(':'),
            "sol" => Some('/'),
            "nbsp" => Some('\u{a0}'),
            _ => body.strip_prefix('#').and_then(decode_numeric),
        };
        out.push(decoded?);
        rest = &tail[len..];
    }
    out.push_str(rest);

    Some(out)
}

fn decode_numeric(num: &str) -> Option<char> {
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

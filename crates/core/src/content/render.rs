//! Block document → display markup.
//!
//! [`ContentRenderer`] is a pure transform: the same content always renders to the same
//! markup, and rendering never fails. Each block kind maps to its fragment independently,
//! and fragments are concatenated in document order with no separator.
//!
//! All author-supplied text is sanitised (see [`super::sanitise`]), because the output is
//! injected into the page as raw HTML.

use super::sanitise::{
    escape_html, is_root_relative, plain_text, safe_url, sanitise_inline, UrlPolicy,
};
use super::{Block, ChecklistItem, Document, ImageBlock, LessonContent, ListItem, ListStyle};
use crate::config::CoreConfig;
use crate::constants::{EMBED_ALLOW_POLICY, NO_CONTENT_PLACEHOLDER};
use lms_types::NonEmptyText;
use serde_json::Value;

/// Renders lesson content to sanitised HTML.
#[derive(Debug, Clone, Default)]
pub struct ContentRenderer {
    api_base_url: Option<String>,
}

impl ContentRenderer {
    /// Creates a renderer that resolves root-relative image URLs against the configured
    /// API base URL.
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            api_base_url: cfg.api_base_url().map(str::to_string),
        }
    }

    /// Renders normalised lesson content.
    ///
    /// Absent content and documents with no blocks render the "no content" placeholder.
    pub fn render(&self, content: &LessonContent) -> String {
        match content {
            LessonContent::Absent => NO_CONTENT_PLACEHOLDER.to_string(),
            LessonContent::Text(text) => paragraph(text),
            LessonContent::Document(doc) => self.render_document(doc),
        }
    }

    /// Renders a raw stored string, which may hold a JSON document or literal text.
    pub fn render_str(&self, raw: Option<&str>) -> String {
        self.render(&LessonContent::from(raw))
    }

    /// Renders a decoded JSON value (document object, string, or null).
    pub fn render_value(&self, value: Option<&Value>) -> String {
        match value {
            None => self.render(&LessonContent::Absent),
            Some(value) => self.render(&LessonContent::from_json_value(value)),
        }
    }

    pub fn render_document(&self, doc: &Document) -> String {
        if doc.is_empty() {
            return NO_CONTENT_PLACEHOLDER.to_string();
        }

        let mut output = String::new();
        for block in &doc.blocks {
            output.push_str(&self.render_block(block));
        }
        output
    }

    pub fn render_block(&self, block: &Block) -> String {
        match block {
            Block::Header { level, text } => format!(
                r#"<h{level} class="lesson-header lesson-header--h{level}">{}</h{level}>"#,
                sanitise_inline(text)
            ),
            Block::Paragraph { text } => paragraph(text),
            Block::List { style, items } => list(*style, items),
            Block::Checklist { items } => checklist(items),
            Block::Quote { text, caption } => quote(text, caption.as_ref()),
            Block::Code { code } => format!(
                r#"<pre class="lesson-code"><code>{}</code></pre>"#,
                escape_html(code)
            ),
            Block::Embed { url, caption } => embed(url, caption.as_ref()),
            Block::Table {
                rows,
                with_headings,
            } => table(rows, *with_headings),
            Block::Image(image) => self.image(image),
            Block::Unknown { original_type } => {
                tracing::warn!(block_type = %original_type, "unsupported block type");
                format!(
                    r#"<div class="lesson-unsupported">unsupported block type: {}</div>"#,
                    escape_html(original_type)
                )
            }
            Block::Invalid { block_type, reason } => {
                tracing::warn!(block_type = %block_type, reason = %reason, "invalid block");
                invalid(block_type, reason)
            }
        }
    }

    /// Prefixes root-relative paths with the API base URL; other URLs pass through.
    pub fn resolve_media_url(&self, url: &str) -> String {
        match &self.api_base_url {
            Some(base) if is_root_relative(url) => {
                format!("{}{}", base, url)
            }
            _ => url.to_string(),
        }
    }

    fn image(&self, image: &ImageBlock) -> String {
        let Some(url) = safe_url(&image.url, UrlPolicy::Media) else {
            return invalid("image", "unsafe url");
        };
        let src = self.resolve_media_url(&url);

        let mut class = String::from("lesson-image");
        if image.with_border {
            class.push_str(" lesson-image--with-border");
        }
        if image.stretched {
            class.push_str(" lesson-image--stretched");
        }
        if image.with_background {
            class.push_str(" lesson-image--with-background");
        }

        let alt = image
            .caption
            .as_ref()
            .map(|c| plain_text(c.as_str()))
            .unwrap_or_default();

        let mut output = format!(
            r#"<figure class="{}"><img src="{}" alt="{}" />"#,
            class,
            escape_html(&src),
            alt
        );
        if let Some(caption) = &image.caption {
            output.push_str(&format!(
                "<figcaption>{}</figcaption>",
                sanitise_inline(caption.as_str())
            ));
        }
        output.push_str("</figure>");
        output
    }
}

fn paragraph(text: &str) -> String {
    format!(r#"<p class="lesson-paragraph">{}</p>"#, sanitise_inline(text))
}

fn invalid(block_type: &str, reason: &str) -> String {
    format!(
        r#"<div class="lesson-unsupported">invalid {} block: {}</div>"#,
        escape_html(block_type),
        escape_html(reason)
    )
}

fn list(style: ListStyle, items: &[ListItem]) -> String {
    let tag = match style {
        ListStyle::Ordered => "ol",
        ListStyle::Unordered => "ul",
    };

    let mut output = format!(
        r#"<{tag} class="lesson-list lesson-list--{}">"#,
        style.as_str()
    );
    for item in items {
        output.push_str("<li>");
        output.push_str(&sanitise_inline(&item.content));
        if !item.items.is_empty() {
            output.push_str(&list(style, &item.items));
        }
        output.push_str("</li>");
    }
    output.push_str(&format!("</{tag}>"));
    output
}

fn checklist(items: &[ChecklistItem]) -> String {
    let mut output = String::from(r#"<div class="lesson-checklist">"#);
    for item in items {
        output.push_str(&format!(
            r#"<label class="lesson-checklist__item"><input type="checkbox" disabled{} /><span>{}</span></label>"#,
            if item.checked { " checked" } else { "" },
            sanitise_inline(&item.text)
        ));
    }
    output.push_str("</div>");
    output
}

fn quote(text: &str, caption: Option<&NonEmptyText>) -> String {
    let mut output = format!(
        r#"<blockquote class="lesson-quote"><p>{}</p>"#,
        sanitise_inline(text)
    );
    if let Some(caption) = caption {
        output.push_str(&format!(
            "<cite>{}</cite>",
            sanitise_inline(caption.as_str())
        ));
    }
    output.push_str("</blockquote>");
    output
}

fn embed(url: &str, caption: Option<&NonEmptyText>) -> String {
    let Some(url) = safe_url(url, UrlPolicy::Media) else {
        return invalid("embed", "unsafe url");
    };

    let mut output = format!(
        r#"<div class="lesson-embed"><iframe src="{}" frameborder="0" allow="{}" allowfullscreen></iframe>"#,
        escape_html(&url),
        EMBED_ALLOW_POLICY
    );
    if let Some(caption) = caption {
        output.push_str(&format!(
            r#"<p class="lesson-embed__caption">{}</p>"#,
            sanitise_inline(caption.as_str())
        ));
    }
    output.push_str("</div>");
    output
}

fn table(rows: &[Vec<String>], with_headings: bool) -> String {
    fn row(cells: &[String], cell_tag: &str) -> String {
        let mut output = String::from("<tr>");
        for cell in cells {
            output.push_str(&format!(
                "<{cell_tag}>{}</{cell_tag}>",
                sanitise_inline(cell)
            ));
        }
        output.push_str("</tr>");
        output
    }

    let mut output = String::from(r#"<table class="lesson-table">"#);
    let body_rows = match rows.split_first() {
        Some((head, rest)) if with_headings => {
            output.push_str(&format!("<thead>{}</thead>", row(head, "th")));
            rest
        }
        _ => rows,
    };

    output.push_str("<tbody>");
    for cells in body_rows {
        output.push_str(&row(cells, "td"));
    }
    output.push_str("</tbody></table>");
    output
}

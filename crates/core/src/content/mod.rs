//! Block-structured lesson content.
//!
//! Lesson bodies are authored in a block editor and stored as JSON of the form
//! `{"blocks": [{"type": "...", "data": {...}}, ...]}`. This module turns that wire shape
//! into a typed [`Document`] and the [`render`] submodule turns a document into sanitised
//! markup.
//!
//! Parsing is lenient. It never fails: missing fields fall back to defaults, unknown block
//! types become [`Block::Unknown`], and known types with unreadable data become
//! [`Block::Invalid`]. Both are rendered as visible markers.

pub mod render;
pub mod sanitise;

use crate::constants::{DEFAULT_HEADER_LEVEL, MAX_HEADER_LEVEL, MAX_LIST_DEPTH, MIN_HEADER_LEVEL};
use lms_types::NonEmptyText;
use serde::Deserialize;
use serde_json::Value;

/// An ordered sequence of blocks. Sequence order is reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Ordered,
    Unordered,
}

impl ListStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ListStyle::Ordered => "ordered",
            ListStyle::Unordered => "unordered",
        }
    }
}

/// A list entry, optionally carrying a nested list of the same style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub content: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub url: String,
    pub caption: Option<NonEmptyText>,
    pub with_border: bool,
    pub stretched: bool,
    pub with_background: bool,
}

/// One typed unit of lesson content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `level` is always within 1..=6.
    Header {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    List {
        style: ListStyle,
        items: Vec<ListItem>,
    },
    Checklist {
        items: Vec<ChecklistItem>,
    },
    Quote {
        text: String,
        caption: Option<NonEmptyText>,
    },
    Code {
        code: String,
    },
    Embed {
        url: String,
        caption: Option<NonEmptyText>,
    },
    Table {
        rows: Vec<Vec<String>>,
        with_headings: bool,
    },
    Image(ImageBlock),
    /// A block type this renderer does not know about.
    Unknown {
        original_type: String,
    },
    /// A known block type whose data could not be read.
    Invalid {
        block_type: String,
        reason: String,
    },
}

impl Block {
    /// The wire `type` tag this block was read from.
    pub fn type_name(&self) -> &str {
        match self {
            Block::Header { .. } => "header",
            Block::Paragraph { .. } => "paragraph",
            Block::List { .. } => "list",
            Block::Checklist { .. } => "checklist",
            Block::Quote { .. } => "quote",
            Block::Code { .. } => "code",
            Block::Embed { .. } => "embed",
            Block::Table { .. } => "table",
            Block::Image(_) => "image",
            Block::Unknown { original_type } => original_type,
            Block::Invalid { block_type, .. } => block_type,
        }
    }

    fn invalid(block_type: &str, reason: impl Into<String>) -> Self {
        Block::Invalid {
            block_type: block_type.to_string(),
            reason: reason.into(),
        }
    }
}

/// Lesson content as it arrives from storage, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonContent {
    /// `null` or missing content.
    Absent,
    /// Legacy plain-text (or HTML) content that is not a block document.
    Text(String),
    Document(Document),
}

impl LessonContent {
    /// Normalises a raw string from storage.
    ///
    /// A string holding a JSON document (`{"blocks": [...]}`) becomes a [`Document`]. Any other
    /// string is literal text, including malformed JSON and valid JSON that is not a document.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) if is_document_shape(&value) => {
                LessonContent::Document(Document::from_json_value(&value))
            }
            Ok(_) => {
                tracing::debug!("content is JSON but not a block document; treating as text");
                LessonContent::Text(raw.to_string())
            }
            Err(e) => {
                tracing::debug!("content is not JSON ({}); treating as text", e);
                LessonContent::Text(raw.to_string())
            }
        }
    }

    /// Normalises an already-decoded JSON value, e.g. a field of an API response.
    pub fn from_json_value(value: &Value) -> Self {
        match value {
            Value::Null => LessonContent::Absent,
            Value::String(s) => LessonContent::parse(s),
            Value::Object(_) if is_document_shape(value) => {
                LessonContent::Document(Document::from_json_value(value))
            }
            other => LessonContent::Document(Document {
                blocks: vec![Block::invalid(
                    "document",
                    format!(
                        "expected an object with a blocks array, got {}",
                        json_kind(other)
                    ),
                )],
            }),
        }
    }

    /// Converts to a document. Absent content has no document; text becomes one paragraph.
    pub fn into_document(self) -> Option<Document> {
        match self {
            LessonContent::Absent => None,
            LessonContent::Text(text) => Some(Document {
                blocks: vec![Block::Paragraph { text }],
            }),
            LessonContent::Document(doc) => Some(doc),
        }
    }
}

impl From<Option<&str>> for LessonContent {
    fn from(value: Option<&str>) -> Self {
        value.map_or(LessonContent::Absent, LessonContent::parse)
    }
}

impl From<Document> for LessonContent {
    fn from(doc: Document) -> Self {
        LessonContent::Document(doc)
    }
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Reads a document from its wire shape.
    ///
    /// Anything that is not an object with a `blocks` array yields a single
    /// [`Block::Invalid`] so the problem is visible when rendered.
    pub fn from_json_value(value: &Value) -> Self {
        let Some(blocks) = value.get("blocks") else {
            return Self::new(vec![Block::invalid("document", "missing blocks array")]);
        };
        let Some(blocks) = blocks.as_array() else {
            return Self::new(vec![Block::invalid(
                "document",
                format!("blocks must be an array, got {}", json_kind(blocks)),
            )]);
        };

        Self::new(blocks.iter().map(block_from_json).collect())
    }
}

fn is_document_shape(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|o| o.get("blocks"))
        .is_some_and(Value::is_array)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// Wire shapes of each block's `data`. Every field defaults so that partially filled
// blocks from the editor still render.

#[derive(Deserialize, Default)]
#[serde(default)]
struct HeaderData {
    text: String,
    level: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ParagraphData {
    text: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListData {
    style: Option<String>,
    items: Vec<RawListItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawListItem {
    Text(String),
    Nested {
        #[serde(default)]
        content: String,
        #[serde(default)]
        items: Vec<RawListItem>,
        #[serde(default)]
        meta: ListItemMeta,
    },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ListItemMeta {
    checked: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ChecklistData {
    items: Vec<RawChecklistItem>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawChecklistItem {
    text: String,
    checked: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct QuoteData {
    text: String,
    caption: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CodeData {
    code: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EmbedData {
    embed: Option<String>,
    url: Option<String>,
    caption: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TableData {
    content: Option<Vec<Vec<Value>>>,
    rows: Option<Vec<Vec<Value>>>,
    #[serde(rename = "withHeadings")]
    with_headings: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ImageData {
    file: Option<ImageFile>,
    url: Option<String>,
    caption: Option<String>,
    #[serde(rename = "withBorder")]
    with_border: bool,
    stretched: bool,
    #[serde(rename = "withBackground")]
    with_background: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ImageFile {
    url: Option<String>,
}

fn block_from_json(raw: &Value) -> Block {
    let Some(block_type) = raw.get("type").and_then(Value::as_str) else {
        return Block::invalid("unknown", "block has no type");
    };
    // Editor output sometimes omits `data` for empty blocks.
    let empty = Value::Object(Default::default());
    let data = match raw.get("data") {
        None | Some(Value::Null) => &empty,
        Some(data) => data,
    };

    let block = match block_type {
        "header" => HeaderData::deserialize(data).map(header_block),
        "paragraph" => ParagraphData::deserialize(data).map(|d| Block::Paragraph { text: d.text }),
        "list" => ListData::deserialize(data).map(list_block),
        "checklist" => ChecklistData::deserialize(data).map(|d| Block::Checklist {
            items: d
                .items
                .into_iter()
                .map(|item| ChecklistItem {
                    text: item.text,
                    checked: item.checked,
                })
                .collect(),
        }),
        "quote" => QuoteData::deserialize(data).map(|d| Block::Quote {
            text: d.text,
            caption: NonEmptyText::optional(d.caption),
        }),
        "code" => CodeData::deserialize(data).map(|d| Block::Code { code: d.code }),
        "embed" => EmbedData::deserialize(data).map(embed_block),
        "table" => TableData::deserialize(data).map(table_block),
        "image" => ImageData::deserialize(data).map(image_block),
        other => {
            return Block::Unknown {
                original_type: other.to_string(),
            }
        }
    };

    block.unwrap_or_else(|e| Block::invalid(block_type, e.to_string()))
}

fn header_block(data: HeaderData) -> Block {
    let requested = data.level.unwrap_or(i64::from(DEFAULT_HEADER_LEVEL));
    let level = requested.clamp(i64::from(MIN_HEADER_LEVEL), i64::from(MAX_HEADER_LEVEL));
    if level != requested {
        tracing::debug!("header level {} clamped to {}", requested, level);
    }
    Block::Header {
        // Clamped into 1..=6 above, so the cast cannot truncate.
        level: level as u8,
        text: data.text,
    }
}

fn list_block(data: ListData) -> Block {
    let style = data.style.as_deref().map(str::trim);

    // Newer list tools encode checklists as a list style with a `checked` flag per item.
    if style == Some("checklist") {
        let mut items = Vec::new();
        flatten_checklist_items(data.items, &mut items);
        return Block::Checklist { items };
    }

    let style = match style {
        Some("ordered") => ListStyle::Ordered,
        _ => ListStyle::Unordered,
    };
    let mut items = Vec::new();
    push_list_items(data.items, 0, &mut items);
    Block::List { style, items }
}

fn push_list_items(raw: Vec<RawListItem>, depth: usize, out: &mut Vec<ListItem>) {
    for item in raw {
        match item {
            RawListItem::Text(content) => out.push(ListItem {
                content,
                items: Vec::new(),
            }),
            RawListItem::Nested { content, items, .. } => {
                if depth + 1 >= MAX_LIST_DEPTH {
                    out.push(ListItem {
                        content,
                        items: Vec::new(),
                    });
                    push_list_items(items, depth, out);
                } else {
                    let mut children = Vec::new();
                    push_list_items(items, depth + 1, &mut children);
                    out.push(ListItem {
                        content,
                        items: children,
                    });
                }
            }
        }
    }
}

fn flatten_checklist_items(raw: Vec<RawListItem>, out: &mut Vec<ChecklistItem>) {
    for item in raw {
        match item {
            RawListItem::Text(text) => out.push(ChecklistItem {
                text,
                checked: false,
            }),
            RawListItem::Nested {
                content,
                items,
                meta,
            } => {
                out.push(ChecklistItem {
                    text: content,
                    checked: meta.checked.unwrap_or(false),
                });
                flatten_checklist_items(items, out);
            }
        }
    }
}

fn embed_block(data: EmbedData) -> Block {
    let url = data
        .embed
        .or(data.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    match url {
        Some(url) => Block::Embed {
            url,
            caption: NonEmptyText::optional(data.caption),
        },
        None => Block::invalid("embed", "embed has no url"),
    }
}

fn table_block(data: TableData) -> Block {
    let rows = data
        .content
        .or(data.rows)
        .unwrap_or_default()
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();
    Block::Table {
        rows,
        with_headings: data.with_headings,
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn image_block(data: ImageData) -> Block {
    let url = data
        .file
        .and_then(|f| f.url)
        .or(data.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    match url {
        Some(url) => Block::Image(ImageBlock {
            url,
            caption: NonEmptyText::optional(data.caption),
            with_border: data.with_border,
            stretched: data.stretched,
            with_background: data.with_background,
        }),
        None => Block::invalid("image", "image has no url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Document {
        Document::from_json_value(&value)
    }

    #[test]
    fn test_parse_paragraph_and_header() {
        let doc = parse(json!({
            "time": 1700000000000u64,
            "blocks": [
                {"id": "a1", "type": "header", "data": {"text": "Intro", "level": 3}},
                {"type": "paragraph", "data": {"text": "Hello"}}
            ],
            "version": "2.28.0"
        }));
        assert_eq!(
            doc.blocks,
            vec![
                Block::Header {
                    level: 3,
                    text: "Intro".into()
                },
                Block::Paragraph {
                    text: "Hello".into()
                },
            ]
        );
    }

    #[test]
    fn test_header_level_is_clamped() {
        let doc = parse(json!({"blocks": [
            {"type": "header", "data": {"text": "a", "level": 0}},
            {"type": "header", "data": {"text": "b", "level": 9}},
            {"type": "header", "data": {"text": "c"}}
        ]}));
        let levels: Vec<u8> = doc
            .blocks
            .iter()
            .map(|b| match b {
                Block::Header { level, .. } => *level,
                other => panic!("unexpected block {:?}", other),
            })
            .collect();
        assert_eq!(levels, vec![1, 6, DEFAULT_HEADER_LEVEL]);
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let doc = parse(json!({"blocks": [{"type": "widget", "data": {}}]}));
        assert_eq!(
            doc.blocks,
            vec![Block::Unknown {
                original_type: "widget".into()
            }]
        );
    }

    #[test]
    fn test_known_type_with_bad_data_is_invalid() {
        let doc = parse(json!({"blocks": [{"type": "paragraph", "data": {"text": 5}}]}));
        assert!(matches!(
            &doc.blocks[0],
            Block::Invalid { block_type, .. } if block_type == "paragraph"
        ));
    }

    #[test]
    fn test_missing_data_uses_defaults() {
        let doc = parse(json!({"blocks": [{"type": "paragraph"}, {"type": "code", "data": null}]}));
        assert_eq!(
            doc.blocks,
            vec![
                Block::Paragraph {
                    text: String::new()
                },
                Block::Code {
                    code: String::new()
                }
            ]
        );
    }

    #[test]
    fn test_block_without_type_is_invalid() {
        let doc = parse(json!({"blocks": [{"data": {"text": "x"}}, "oops"]}));
        assert_eq!(doc.blocks.len(), 2);
        assert!(doc
            .blocks
            .iter()
            .all(|b| matches!(b, Block::Invalid { .. })));
    }

    #[test]
    fn test_nested_list_items() {
        let doc = parse(json!({"blocks": [{"type": "list", "data": {
            "style": "ordered",
            "items": [
                "plain",
                {"content": "parent", "items": [{"content": "child", "items": []}]}
            ]
        }}]}));
        let Block::List { style, items } = &doc.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(*style, ListStyle::Ordered);
        assert_eq!(items[0].content, "plain");
        assert_eq!(items[1].content, "parent");
        assert_eq!(items[1].items[0].content, "child");
    }

    #[test]
    fn test_list_style_defaults_to_unordered() {
        let doc = parse(json!({"blocks": [{"type": "list", "data": {"items": ["a"]}}]}));
        assert!(matches!(
            &doc.blocks[0],
            Block::List {
                style: ListStyle::Unordered,
                ..
            }
        ));
    }

    #[test]
    fn test_deep_list_is_flattened_past_limit() {
        let mut item = json!({"content": "leaf", "items": []});
        for i in 0..(MAX_LIST_DEPTH + 4) {
            item = json!({"content": format!("level {}", i), "items": [item]});
        }
        let doc = parse(json!({"blocks": [{"type": "list", "data": {"items": [item]}}]}));

        fn depth(items: &[ListItem]) -> usize {
            items.iter().map(|i| 1 + depth(&i.items)).max().unwrap_or(0)
        }
        let Block::List { items, .. } = &doc.blocks[0] else {
            panic!("expected list");
        };
        assert!(depth(items) <= MAX_LIST_DEPTH);
    }

    #[test]
    fn test_list_checklist_style_becomes_checklist() {
        let doc = parse(json!({"blocks": [{"type": "list", "data": {
            "style": "checklist",
            "items": [
                {"content": "done", "meta": {"checked": true}, "items": []},
                {"content": "todo", "meta": {}, "items": []}
            ]
        }}]}));
        assert_eq!(
            doc.blocks[0],
            Block::Checklist {
                items: vec![
                    ChecklistItem {
                        text: "done".into(),
                        checked: true
                    },
                    ChecklistItem {
                        text: "todo".into(),
                        checked: false
                    },
                ]
            }
        );
    }

    #[test]
    fn test_image_reads_file_url_and_flags() {
        let doc = parse(json!({"blocks": [{"type": "image", "data": {
            "file": {"url": "/img/a.png"},
            "caption": "  ",
            "withBorder": true
        }}]}));
        assert_eq!(
            doc.blocks[0],
            Block::Image(ImageBlock {
                url: "/img/a.png".into(),
                caption: None,
                with_border: true,
                stretched: false,
                with_background: false,
            })
        );
    }

    #[test]
    fn test_image_without_url_is_invalid() {
        let doc = parse(json!({"blocks": [{"type": "image", "data": {"file": {}}}]}));
        assert!(matches!(&doc.blocks[0], Block::Invalid { block_type, .. } if block_type == "image"));
    }

    #[test]
    fn test_table_accepts_content_or_rows_and_non_string_cells() {
        let doc = parse(json!({"blocks": [
            {"type": "table", "data": {"content": [["a", 1], [null, true]]}},
            {"type": "table", "data": {"rows": [["x"]], "withHeadings": true}}
        ]}));
        assert_eq!(
            doc.blocks,
            vec![
                Block::Table {
                    rows: vec![
                        vec!["a".into(), "1".into()],
                        vec!["".into(), "true".into()]
                    ],
                    with_headings: false
                },
                Block::Table {
                    rows: vec![vec!["x".into()]],
                    with_headings: true
                }
            ]
        );
    }

    #[test]
    fn test_embed_prefers_embed_field() {
        let doc = parse(json!({"blocks": [{"type": "embed", "data": {
            "service": "youtube",
            "source": "https://www.youtube.com/watch?v=abc",
            "embed": "https://www.youtube.com/embed/abc",
            "caption": "Watch"
        }}]}));
        assert_eq!(
            doc.blocks[0],
            Block::Embed {
                url: "https://www.youtube.com/embed/abc".into(),
                caption: Some(NonEmptyText::new("Watch").unwrap())
            }
        );
    }

    #[test]
    fn test_lesson_content_parse_string_variants() {
        assert_eq!(
            LessonContent::parse("hello"),
            LessonContent::Text("hello".into())
        );
        assert_eq!(LessonContent::parse("42"), LessonContent::Text("42".into()));
        assert_eq!(
            LessonContent::parse(r#"{"title": "x"}"#),
            LessonContent::Text(r#"{"title": "x"}"#.into())
        );
        assert!(matches!(
            LessonContent::parse(r#"{"blocks": []}"#),
            LessonContent::Document(doc) if doc.is_empty()
        ));
    }

    #[test]
    fn test_lesson_content_from_json_value() {
        assert_eq!(
            LessonContent::from_json_value(&Value::Null),
            LessonContent::Absent
        );
        assert_eq!(
            LessonContent::from_json_value(&json!("plain")),
            LessonContent::Text("plain".into())
        );
        let LessonContent::Document(doc) = LessonContent::from_json_value(&json!([1, 2])) else {
            panic!("expected document");
        };
        assert!(matches!(&doc.blocks[0], Block::Invalid { block_type, .. } if block_type == "document"));
    }

    #[test]
    fn test_into_document() {
        assert_eq!(LessonContent::Absent.into_document(), None);
        assert_eq!(
            LessonContent::Text("hi".into()).into_document(),
            Some(Document::new(vec![Block::Paragraph { text: "hi".into() }]))
        );
    }
}

//! Notion block tree → Markdown, plus the opaque block-map form.

use serde_json::{Map, Value, json};

use super::model::{Block, RichText, plain_text};

const INDENT: &str = "    ";

/// Render a block tree as GitHub-flavoured Markdown. Unknown block types are
/// skipped; their children are still rendered.
pub fn blocks_to_markdown(blocks: &[Block]) -> String {
    let mut rendered: Vec<String> = Vec::new();
    let mut numbered = 0usize;

    for block in blocks {
        if block.kind == "numbered_list_item" {
            numbered += 1;
        } else {
            numbered = 0;
        }

        let markdown = block_to_markdown(block, numbered.max(1));
        if !markdown.is_empty() {
            rendered.push(markdown);
        }
    }

    rendered.join("\n\n")
}

fn block_to_markdown(block: &Block, ordinal: usize) -> String {
    let content = block.content();
    let text = rich_text_to_markdown(&content.rich_text);

    match block.kind.as_str() {
        "paragraph" => with_children(text, &block.children, ""),
        "heading_1" => with_children(format!("# {text}"), &block.children, ""),
        "heading_2" => with_children(format!("## {text}"), &block.children, ""),
        "heading_3" => with_children(format!("### {text}"), &block.children, ""),
        "bulleted_list_item" => with_children(format!("- {text}"), &block.children, INDENT),
        "numbered_list_item" => {
            with_children(format!("{ordinal}. {text}"), &block.children, INDENT)
        }
        "to_do" => {
            let mark = if content.checked.unwrap_or(false) { "x" } else { " " };
            with_children(format!("- [{mark}] {text}"), &block.children, INDENT)
        }
        "quote" => {
            let body = with_children(text, &block.children, "");
            prefix_lines(&body, "> ")
        }
        "code" => {
            let language = code_language(content.language.as_deref());
            format!("```{language}\n{}\n```", plain_text(&content.rich_text))
        }
        "divider" => "---".to_string(),
        "equation" => match content.expression.as_deref() {
            Some(expression) if !expression.trim().is_empty() => {
                format!("$$\n{}\n$$", expression.trim())
            }
            _ => String::new(),
        },
        "image" => match content.asset_url() {
            Some(url) => format!("![{}]({url})", plain_text(&content.caption)),
            None => String::new(),
        },
        "bookmark" | "embed" | "link_preview" | "video" | "pdf" | "file" => {
            match content.asset_url() {
                Some(url) => {
                    let caption = plain_text(&content.caption);
                    let label = if caption.trim().is_empty() { url } else { caption.trim() };
                    format!("[{label}]({url})")
                }
                None => String::new(),
            }
        }
        "callout" => {
            let body = escape_html(&plain_text(&content.rich_text));
            format!("<aside class=\"notion-aside\">{body}</aside>")
        }
        "toggle" => {
            let inner = blocks_to_markdown(&block.children);
            format!("<details><summary>{text}</summary>\n\n{inner}\n\n</details>")
        }
        "table" => table_to_markdown(block, content.has_column_header),
        "child_page" | "child_database" => match content.title.as_deref() {
            Some(title) if !title.trim().is_empty() => format!("## {}", title.trim()),
            _ => String::new(),
        },
        _ => blocks_to_markdown(&block.children),
    }
}

/// Append rendered children below `head`, indented by `indent`.
fn with_children(head: String, children: &[Block], indent: &str) -> String {
    if children.is_empty() {
        return head;
    }
    let nested = blocks_to_markdown(children);
    if nested.is_empty() {
        return head;
    }
    let nested = if indent.is_empty() {
        nested
    } else {
        prefix_lines(&nested, indent)
    };
    if head.is_empty() {
        nested
    } else {
        format!("{head}\n\n{nested}")
    }
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_to_markdown(table: &Block, has_column_header: bool) -> String {
    let rows: Vec<Vec<String>> = table
        .children
        .iter()
        .filter(|row| row.kind == "table_row")
        .map(|row| {
            row.content()
                .cells
                .iter()
                .map(|cell| escape_table_cell(&rich_text_to_markdown(cell)))
                .collect()
        })
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let render_row = |cells: &[String]| {
        let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
        padded.resize(width, "");
        format!("| {} |", padded.join(" | "))
    };

    let (header, body) = if has_column_header {
        (rows[0].clone(), &rows[1..])
    } else {
        (vec![String::new(); width], &rows[..])
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(&header));
    lines.push(format!("|{}", " --- |".repeat(width)));
    for row in body {
        lines.push(render_row(row));
    }
    lines.join("\n")
}

fn code_language(language: Option<&str>) -> &str {
    match language.map(str::trim) {
        None | Some("") | Some("plain text") => "",
        Some(language) => language.split_whitespace().next().unwrap_or(""),
    }
}

/// Rich text with annotations as inline Markdown. Surrounding whitespace is
/// kept outside the markers so emphasis stays valid.
pub fn rich_text_to_markdown(segments: &[RichText]) -> String {
    segments.iter().map(segment_to_markdown).collect()
}

fn segment_to_markdown(segment: &RichText) -> String {
    let text = segment.plain_text.as_str();
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];

    let annotations = segment.annotations;
    let mut styled = if annotations.code {
        format!("`{core}`")
    } else {
        core.to_string()
    };
    if annotations.bold {
        styled = format!("**{styled}**");
    }
    if annotations.italic {
        styled = format!("_{styled}_");
    }
    if annotations.strikethrough {
        styled = format!("~~{styled}~~");
    }
    if let Some(href) = segment.href.as_deref().filter(|href| !href.is_empty()) {
        styled = format!("[{styled}]({href})");
    }

    format!("{leading}{styled}{trailing}")
}

fn escape_table_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Flatten a block tree into a map keyed by block id. Each entry keeps the
/// block type, its raw payload and the ids of its children.
pub fn blocks_to_map(blocks: &[Block]) -> Value {
    let mut map = Map::new();
    insert_blocks(blocks, &mut map);
    Value::Object(map)
}

fn insert_blocks(blocks: &[Block], map: &mut Map<String, Value>) {
    for block in blocks {
        let children: Vec<&str> = block.children.iter().map(|child| child.id.as_str()).collect();
        map.insert(
            block.id.clone(),
            json!({
                "type": block.kind,
                "value": block.raw_content(),
                "children": children,
            }),
        );
        insert_blocks(&block.children, map);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn block(value: serde_json::Value) -> Block {
        serde_json::from_value(value).expect("block")
    }

    fn text_block(kind: &str, text: &str) -> Block {
        block(json!({
            "id": format!("{kind}-{text}"),
            "type": kind,
            kind: { "rich_text": [{ "plain_text": text }] }
        }))
    }

    #[test]
    fn converts_common_blocks() {
        let blocks = vec![
            text_block("heading_1", "Title"),
            text_block("paragraph", "Intro"),
            text_block("bulleted_list_item", "one"),
            text_block("numbered_list_item", "first"),
            text_block("numbered_list_item", "second"),
            block(json!({ "id": "d", "type": "divider", "divider": {} })),
            block(json!({
                "id": "c",
                "type": "code",
                "code": { "language": "rust", "rich_text": [{ "plain_text": "let x = 1;" }] }
            })),
        ];

        let markdown = blocks_to_markdown(&blocks);
        assert_eq!(
            markdown,
            "# Title\n\nIntro\n\n- one\n\n1. first\n\n2. second\n\n---\n\n```rust\nlet x = 1;\n```"
        );
    }

    #[test]
    fn callouts_become_asides() {
        let blocks = vec![text_block("callout", "Mind the <gap>")];
        assert_eq!(
            blocks_to_markdown(&blocks),
            "<aside class=\"notion-aside\">Mind the &lt;gap&gt;</aside>"
        );
    }

    #[test]
    fn annotations_and_links() {
        let segments: Vec<RichText> = serde_json::from_value(json!([
            { "plain_text": "bold ", "annotations": { "bold": true } },
            { "plain_text": "code", "annotations": { "code": true } },
            { "plain_text": " and " },
            { "plain_text": "link", "href": "https://example.com" }
        ]))
        .expect("rich text");

        assert_eq!(
            rich_text_to_markdown(&segments),
            "**bold** `code` and [link](https://example.com)"
        );
    }

    #[test]
    fn nested_list_children_are_indented() {
        let mut parent = text_block("bulleted_list_item", "parent");
        parent.children = vec![text_block("bulleted_list_item", "child")];
        assert_eq!(blocks_to_markdown(&[parent]), "- parent\n\n    - child");
    }

    #[test]
    fn tables_render_as_gfm() {
        let mut table = block(json!({
            "id": "t",
            "type": "table",
            "table": { "table_width": 2, "has_column_header": true }
        }));
        table.children = vec![
            block(json!({
                "id": "r1",
                "type": "table_row",
                "table_row": { "cells": [[{ "plain_text": "a" }], [{ "plain_text": "b" }]] }
            })),
            block(json!({
                "id": "r2",
                "type": "table_row",
                "table_row": { "cells": [[{ "plain_text": "1" }], [{ "plain_text": "x|y" }]] }
            })),
        ];

        assert_eq!(
            blocks_to_markdown(&[table]),
            "| a | b |\n| --- | --- |\n| 1 | x\\|y |"
        );
    }

    #[test]
    fn block_map_is_keyed_by_id() {
        let mut toggle = text_block("toggle", "More");
        toggle.children = vec![text_block("paragraph", "Hidden")];
        let map = blocks_to_map(&[toggle]);

        assert_eq!(map["toggle-More"]["type"], "toggle");
        assert_eq!(map["toggle-More"]["children"][0], "paragraph-Hidden");
        assert_eq!(map["paragraph-Hidden"]["type"], "paragraph");
    }
}

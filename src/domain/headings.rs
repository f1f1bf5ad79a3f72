//! Outline extraction straight from Markdown source.

use super::entities::HeadingItem;
use super::slug::AnchorSlugger;

/// Deepest heading level collected when callers do not ask otherwise.
pub const DEFAULT_MAX_LEVEL: u8 = 4;

/// Collect ATX headings (`#` .. `######`) up to `max_level`, in document order.
///
/// Trailing closing markers (`## Title ##`) are dropped. Lines inside fenced
/// code blocks are ignored. Ids are slugs of the heading text, suffixed when
/// the same text repeats.
pub fn extract_headings(markdown: &str, max_level: u8) -> Vec<HeadingItem> {
    let max_level = max_level.clamp(1, 6);
    let mut slugger = AnchorSlugger::new();
    let mut fence: Option<Fence> = None;
    let mut headings = Vec::new();

    for line in markdown.lines() {
        if let Some(open) = fence {
            if open.closes(line) {
                fence = None;
            }
            continue;
        }
        if let Some(opened) = Fence::opening(line) {
            fence = Some(opened);
            continue;
        }

        let Some((level, text)) = parse_heading(line, max_level) else {
            continue;
        };

        headings.push(HeadingItem {
            id: slugger.anchor_for(&text),
            text,
            level,
        });
    }

    headings
}

fn parse_heading(line: &str, max_level: u8) -> Option<(u8, String)> {
    let markers = line.bytes().take_while(|byte| *byte == b'#').count();
    if markers == 0 || markers > usize::from(max_level) {
        return None;
    }

    let rest = &line[markers..];
    if !rest.starts_with(|ch: char| ch.is_whitespace()) {
        return None;
    }

    let raw = rest.trim();
    if raw.is_empty() {
        return None;
    }

    let text = raw.trim_end_matches('#').trim();
    if text.is_empty() {
        return None;
    }

    let level = u8::try_from(markers).ok()?;
    Some((level, text.to_string()))
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: u8,
    width: usize,
}

impl Fence {
    fn opening(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = *trimmed.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let width = trimmed.bytes().take_while(|byte| *byte == marker).count();
        (width >= 3).then_some(Self { marker, width })
    }

    fn closes(self, line: &str) -> bool {
        let trimmed = line.trim();
        let width = trimmed.bytes().take_while(|byte| *byte == self.marker).count();
        width >= self.width && width == trimmed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels_and_text(headings: &[HeadingItem]) -> Vec<(u8, &str)> {
        headings
            .iter()
            .map(|heading| (heading.level, heading.text.as_str()))
            .collect()
    }

    #[test]
    fn extracts_headings_in_document_order() {
        let headings = extract_headings("# Title\n## Sub\n", DEFAULT_MAX_LEVEL);
        assert_eq!(levels_and_text(&headings), vec![(1, "Title"), (2, "Sub")]);
        assert_eq!(headings[0].id, "title");
        assert_eq!(headings[1].id, "sub");
    }

    #[test]
    fn strips_closing_markers_and_respects_max_level() {
        let markdown = "## Closing ##\n#### Deep\n##### Deeper\n#NoSpace\n";
        let headings = extract_headings(markdown, DEFAULT_MAX_LEVEL);
        assert_eq!(
            levels_and_text(&headings),
            vec![(2, "Closing"), (4, "Deep")]
        );
    }

    #[test]
    fn ignores_fenced_code() {
        let markdown = "# Intro\n```bash\n# not a heading\n```\n## Usage\n~~~~\n# also code\n~~~~\n";
        let headings = extract_headings(markdown, 6);
        assert_eq!(levels_and_text(&headings), vec![(1, "Intro"), (2, "Usage")]);
    }

    #[test]
    fn repeated_headings_receive_unique_ids() {
        let markdown = "## Setup\ntext\n## Setup\n## Hello, World!\n";
        let ids: Vec<_> = extract_headings(markdown, DEFAULT_MAX_LEVEL)
            .into_iter()
            .map(|heading| heading.id)
            .collect();
        assert_eq!(ids, vec!["setup", "setup-2", "hello-world"]);
    }

    #[test]
    fn handles_crlf_input() {
        let headings = extract_headings("# One\r\n## Two\r\n", DEFAULT_MAX_LEVEL);
        assert_eq!(levels_and_text(&headings), vec![(1, "One"), (2, "Two")]);
    }
}

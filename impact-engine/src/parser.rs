use crate::types::{EngineError, ParsedFeed, RawNewsItem, Result};
use feed_rs::parser;
use tracing::{debug, info, warn};

const RSS_WRAPPER: (&str, &str) = ("<rss version=\"2.0\"><channel>", "</channel></rss>");
const ATOM_WRAPPER: (&str, &str) = ("<feed xmlns=\"http://www.w3.org/2005/Atom\">", "</feed>");

#[derive(Debug, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS/Atom document. When the document as a whole is rejected,
    /// each `<item>`/`<entry>` block is retried on its own and whatever parses
    /// is returned with `salvaged` set.
    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        match parser::parse(content.as_bytes()) {
            Ok(feed) => {
                let title = feed.title.map(|t| t.content);
                let entries: Vec<RawNewsItem> = feed.entries.into_iter().map(Self::parse_entry).collect();

                info!("Parsed feed with {} entries", entries.len());
                Ok(ParsedFeed {
                    title,
                    entries,
                    salvaged: false,
                })
            }
            Err(e) => {
                warn!("Feed document is malformed ({}), salvaging individual entries", e);
                let entries = self.salvage_entries(content);
                if entries.is_empty() {
                    return Err(EngineError::Parse(format!("Failed to parse feed: {}", e)));
                }

                info!("Salvaged {} entries from malformed feed", entries.len());
                Ok(ParsedFeed {
                    title: None,
                    entries,
                    salvaged: true,
                })
            }
        }
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> RawNewsItem {
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        RawNewsItem {
            title: entry.title.map(|t| t.content),
            summary,
            link: entry.links.first().map(|l| l.href.clone()),
            published: entry.published.or(entry.updated).map(|dt| dt.to_rfc3339()),
        }
    }

    fn salvage_entries(&self, content: &str) -> Vec<RawNewsItem> {
        let (blocks, (open, close)) = {
            let items = element_blocks(content, "item");
            if items.is_empty() {
                (element_blocks(content, "entry"), ATOM_WRAPPER)
            } else {
                (items, RSS_WRAPPER)
            }
        };

        blocks
            .into_iter()
            .filter_map(|block| {
                let document = format!("{}{}{}", open, block, close);
                match parser::parse(document.as_bytes()) {
                    Ok(feed) => feed.entries.into_iter().next().map(Self::parse_entry),
                    Err(e) => {
                        debug!("Dropping unreadable entry: {}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Complete `<tag ...>...</tag>` spans in document order. Unterminated spans are skipped.
fn element_blocks<'a>(content: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = content[cursor..].find(&open) {
        let start = cursor + offset;
        let after_name = start + open.len();
        let is_tag = content[after_name..]
            .chars()
            .next()
            .map_or(false, |c| c == '>' || c.is_whitespace());
        if !is_tag {
            cursor = after_name;
            continue;
        }

        match content[after_name..].find(&close) {
            Some(end_offset) => {
                let end = after_name + end_offset + close.len();
                blocks.push(&content[start..end]);
                cursor = end;
            }
            None => break,
        }
    }

    blocks
}

//! Types for the setlist module.

use reqwest::Url;

/// One entry to download.
///
/// Empty `track` or `artist` means the page's own metadata is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-based line number in the source file, for diagnostics.
    pub line: usize,
    /// Title override.
    pub track: String,
    /// Artist override.
    pub artist: String,
    /// Page to hand to the conversion service.
    pub source_url: Url,
}

impl WorkItem {
    /// Short human-readable label for logs.
    pub fn label(&self) -> String {
        match (self.artist.is_empty(), self.track.is_empty()) {
            (true, true) => self.source_url.to_string(),
            (true, false) => format!("{} <{}>", self.track, self.source_url),
            (false, true) => format!("{} <{}>", self.artist, self.source_url),
            (false, false) => format!("{} - {} <{}>", self.artist, self.track, self.source_url),
        }
    }
}

/// Ordered, immutable list of work items. Order is processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setlist {
    items: Vec<WorkItem>,
}

impl Setlist {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }
}

impl From<Vec<WorkItem>> for Setlist {
    fn from(items: Vec<WorkItem>) -> Self {
        Self::new(items)
    }
}

impl<'a> IntoIterator for &'a Setlist {
    type Item = &'a WorkItem;
    type IntoIter = std::slice::Iter<'a, WorkItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A line that could not be turned into a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// Result of parsing a whole setlist.
#[derive(Debug, Clone, Default)]
pub struct ParsedSetlist {
    pub setlist: Setlist,
    pub rejected: Vec<RejectedLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(track: &str, artist: &str) -> WorkItem {
        WorkItem {
            line: 1,
            track: track.to_string(),
            artist: artist.to_string(),
            source_url: Url::parse("https://a.test/1").unwrap(),
        }
    }

    #[test]
    fn test_label() {
        assert_eq!(item("", "").label(), "https://a.test/1");
        assert_eq!(item("Song", "").label(), "Song <https://a.test/1>");
        assert_eq!(item("Song", "Alice").label(), "Alice - Song <https://a.test/1>");
    }

    #[test]
    fn test_setlist_preserves_order_and_duplicates() {
        let setlist = Setlist::from(vec![item("a", ""), item("b", ""), item("a", "")]);
        assert_eq!(setlist.len(), 3);
        let tracks: Vec<_> = setlist.iter().map(|i| i.track.as_str()).collect();
        assert_eq!(tracks, vec!["a", "b", "a"]);
    }
}

//! Line parser for setlist files.

use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use reqwest::Url;
use tracing::{debug, warn};

use super::error::SetlistError;
use super::types::{ParsedSetlist, RejectedLine, Setlist, WorkItem};

/// Delimiter between metadata and URL in the asterisk encoding.
const METADATA_DELIMITER: char = '*';

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("URL pattern is valid"))
}

/// Split free-text metadata into `(track, artist)`.
///
/// The first `-` separates artist from track. Without one, the whole string
/// is the track and the artist is empty.
pub fn get_track_and_artist(info: &str) -> (String, String) {
    let info = info.trim();
    match info.split_once('-') {
        Some((artist, track)) => (track.trim().to_string(), artist.trim().to_string()),
        None => (info.to_string(), String::new()),
    }
}

/// Parse a single setlist line.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line_no: usize, raw: &str) -> Result<Option<WorkItem>, SetlistError> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    // An asterisk is the delimiter only when nothing but whitespace separates
    // it from the URL. Asterisks elsewhere belong to the metadata or the URL.
    let (info, url_token) = match url_regex().find(line) {
        Some(m) => {
            let before = line[..m.start()].trim_end();
            let info = before.strip_suffix(METADATA_DELIMITER).unwrap_or(before);
            (info, m.as_str())
        }
        None => {
            let pos = line
                .rfind(METADATA_DELIMITER)
                .ok_or(SetlistError::MissingUrl { line: line_no })?;
            let token = line[pos + METADATA_DELIMITER.len_utf8()..]
                .split_whitespace()
                .next()
                .ok_or(SetlistError::MissingUrl { line: line_no })?;
            (&line[..pos], token)
        }
    };

    let source_url = parse_source_url(line_no, url_token)?;
    let (track, artist) = get_track_and_artist(info);

    Ok(Some(WorkItem {
        line: line_no,
        track,
        artist,
        source_url,
    }))
}

fn parse_source_url(line_no: usize, token: &str) -> Result<Url, SetlistError> {
    let url = Url::parse(token).map_err(|e| SetlistError::InvalidUrl {
        line: line_no,
        url: token.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SetlistError::InvalidUrl {
            line: line_no,
            url: token.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}

/// Parse a whole setlist. Bad lines are logged and collected, never fatal.
pub fn parse_setlist(text: &str) -> ParsedSetlist {
    let mut items = Vec::new();
    let mut rejected = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        match parse_line(line_no, raw) {
            Ok(Some(item)) => {
                debug!("Parsed setlist line {}: {}", line_no, item.label());
                items.push(item);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping setlist entry: {}", e);
                rejected.push(RejectedLine {
                    line: line_no,
                    content: raw.trim().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    ParsedSetlist {
        setlist: Setlist::new(items),
        rejected,
    }
}

/// Read and parse a setlist file.
pub async fn load_setlist(path: &Path) -> Result<ParsedSetlist, SetlistError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SetlistError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SetlistError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    Ok(parse_setlist(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> WorkItem {
        parse_line(1, line).unwrap().unwrap()
    }

    #[test]
    fn test_track_and_artist_split() {
        assert_eq!(
            get_track_and_artist("Alice - Song Title"),
            ("Song Title".to_string(), "Alice".to_string())
        );
        assert_eq!(
            get_track_and_artist("Song Title"),
            ("Song Title".to_string(), String::new())
        );
    }

    #[test]
    fn test_track_and_artist_splits_on_first_dash_only() {
        let (track, artist) = get_track_and_artist("Alice - Song - Live Version");
        assert_eq!(artist, "Alice");
        assert_eq!(track, "Song - Live Version");
    }

    #[test]
    fn test_asterisk_encoding() {
        let item = parse("A - X * https://a.test/1");
        assert_eq!(item.artist, "A");
        assert_eq!(item.track, "X");
        assert_eq!(item.source_url.as_str(), "https://a.test/1");
    }

    #[test]
    fn test_prefix_encoding() {
        let item = parse("Alice - Song Title https://www.youtube.com/watch?v=abc123");
        assert_eq!(item.artist, "Alice");
        assert_eq!(item.track, "Song Title");
        assert_eq!(
            item.source_url.as_str(),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn test_bare_url_has_no_overrides() {
        let item = parse("https://a.test/2");
        assert!(item.track.is_empty());
        assert!(item.artist.is_empty());
        assert_eq!(item.source_url.as_str(), "https://a.test/2");
    }

    #[test]
    fn test_surrounding_whitespace_is_irrelevant() {
        let lines = [
            "Alice - Song*https://a.test/1",
            "   Alice   -   Song   *   https://a.test/1   ",
            "\tAlice - Song * https://a.test/1\t",
        ];
        let expected = parse(lines[0]);
        for line in &lines[1..] {
            assert_eq!(parse(line), expected, "line: {:?}", line);
        }

        let prefixed = ["Alice - Song https://a.test/1", "  Alice -Song   https://a.test/1  "];
        let expected = parse(prefixed[0]);
        assert_eq!(parse(prefixed[1]), expected);
    }

    #[test]
    fn test_asterisk_inside_url_is_not_a_delimiter() {
        let item = parse("https://a.test/search?q=a*b");
        assert!(item.track.is_empty());
        assert_eq!(item.source_url.as_str(), "https://a.test/search?q=a*b");
    }

    #[test]
    fn test_asterisk_in_metadata_is_not_a_delimiter() {
        let item = parse("M*A*S*H - Theme https://a.test/1");
        assert_eq!(item.artist, "M*A*S*H");
        assert_eq!(item.track, "Theme");
        assert_eq!(item.source_url.as_str(), "https://a.test/1");

        let item = parse("M*A*S*H - Theme * https://a.test/1");
        assert_eq!(item.artist, "M*A*S*H");
        assert_eq!(item.track, "Theme");
    }

    #[test]
    fn test_line_without_url_fails() {
        let err = parse_line(7, "Alice - Song Title").unwrap_err();
        assert!(matches!(err, SetlistError::MissingUrl { line: 7 }));

        let err = parse_line(3, "Alice - Song *   ").unwrap_err();
        assert!(matches!(err, SetlistError::MissingUrl { line: 3 }));
    }

    #[test]
    fn test_asterisk_with_non_url_fails() {
        let err = parse_line(2, "Song * not-a-url").unwrap_err();
        assert!(matches!(err, SetlistError::InvalidUrl { line: 2, .. }));

        let err = parse_line(2, "Song * ftp://a.test/file").unwrap_err();
        assert!(matches!(err, SetlistError::InvalidUrl { .. }));
    }

    #[test]
    fn test_blank_and_comment_lines_are_ignored() {
        assert!(parse_line(1, "").unwrap().is_none());
        assert!(parse_line(1, "    ").unwrap().is_none());
        assert!(parse_line(1, "# friday set").unwrap().is_none());
    }

    #[test]
    fn test_parse_setlist_drops_bad_line_and_keeps_order() {
        let text = "\
A - One * https://a.test/1
https://a.test/2
no url on this line
C - Three https://a.test/3
https://a.test/4
";
        let parsed = parse_setlist(text);
        assert_eq!(parsed.setlist.len(), 4);
        let lines: Vec<_> = parsed.setlist.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 5]);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 3);
        assert_eq!(parsed.rejected[0].content, "no url on this line");
    }

    #[test]
    fn test_parse_setlist_keeps_duplicates() {
        let parsed = parse_setlist("https://a.test/1\nhttps://a.test/1\n");
        assert_eq!(parsed.setlist.len(), 2);
        assert!(parsed.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_load_setlist_missing_file() {
        let err = load_setlist(Path::new("/nonexistent/setlist.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SetlistError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_setlist_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setlist.txt");
        tokio::fs::write(&path, "A - X * https://a.test/1\nhttps://a.test/2\n")
            .await
            .unwrap();

        let parsed = load_setlist(&path).await.unwrap();
        assert_eq!(parsed.setlist.len(), 2);
        assert_eq!(parsed.setlist.items()[0].artist, "A");
    }
}

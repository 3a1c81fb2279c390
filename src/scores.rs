//! Persist game scores to disk (XDG config or ~/.config/blockstui).
//!
//! One line per finished game: `unix-timestamp<TAB>score`. Saving is
//! fire-and-forget for callers; scores are only read back on the menu and
//! game-over screens, never during play.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const FILENAME: &str = "scores";

/// Returns the path to the scores file (config dir / blockstui / scores).
fn config_path() -> Result<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    Ok(base.join("blockstui").join(FILENAME))
}

fn parse_line(line: &str) -> Option<(u64, u32)> {
    let mut parts = line.split_whitespace();
    let timestamp = parts.next()?.parse().ok()?;
    let score = parts.next()?.parse().ok()?;
    Some((timestamp, score))
}

fn parse_scores(content: &str) -> Vec<(u64, u32)> {
    content.lines().filter_map(parse_line).collect()
}

fn read_all() -> Vec<(u64, u32)> {
    let path = match config_path() {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };
    match fs::read_to_string(path) {
        Ok(content) => parse_scores(&content),
        Err(_) => Vec::new(),
    }
}

/// Append one finished game's score. Creates the config directory if needed.
pub fn save_score(score: u32) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{timestamp}\t{score}")?;
    Ok(())
}

fn top_of(records: Vec<(u64, u32)>, n: usize) -> Vec<u32> {
    let mut scores: Vec<u32> = records.into_iter().map(|(_, s)| s).collect();
    scores.sort_unstable_by(|a, b| b.cmp(a));
    scores.truncate(n);
    scores
}

/// The `n` highest scores, descending. Missing or unreadable file is empty.
pub fn top_scores(n: usize) -> Vec<u32> {
    top_of(read_all(), n)
}

/// Every recorded score, keyed by timestamp.
pub fn all_scores() -> BTreeMap<u64, u32> {
    read_all().into_iter().collect()
}

/// Highest score ever recorded; 0 when none.
pub fn best_score() -> u32 {
    top_scores(1).first().copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_lines() {
        assert_eq!(parse_line("1700000000\t42"), Some((1_700_000_000, 42)));
        assert_eq!(parse_line("not a line"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn skips_malformed_lines() {
        let content = "100\t5\ngarbage\n200\t9\n\n300\t1\n";
        let records = parse_scores(content);
        assert_eq!(records, vec![(100, 5), (200, 9), (300, 1)]);
    }

    #[test]
    fn top_is_descending_and_truncated() {
        let records = vec![(1, 5), (2, 30), (3, 12), (4, 30), (5, 7)];
        assert_eq!(top_of(records, 3), vec![30, 30, 12]);
    }

    #[test]
    fn top_of_fewer_records_than_requested() {
        assert_eq!(top_of(vec![(1, 8)], 10), vec![8]);
        assert_eq!(top_of(Vec::new(), 10), Vec::<u32>::new());
    }
}

//! Plain-text lists of names to extract.
//!
//! ```text
//! // title screen
//! data/title.bin
//! Sound/BGM/Title.at3
//! [END]
//! anything after the marker is ignored
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Line that ends a list.
pub const END_MARKER: &str = "[END]";
const COMMENT_PREFIX: &str = "//";

/// One name per line. Blank lines and `//` comments are skipped, parsing
/// stops at [`END_MARKER`], and repeated names keep their first position.
pub fn parse_file_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line == END_MARKER {
            break;
        }
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        if seen.insert(line) {
            names.push(line.to_owned());
        }
    }
    names
}

pub fn read_file_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_file_list(&text))
}

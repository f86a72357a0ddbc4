// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Parser for the conversion record Siril writes alongside a converted
//! sequence, mapping each source frame to its sequence index.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// One line of a conversion file: a source frame and the sequence file it
/// became.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

// Lines look like: 'IMG_0001.CR2' -> 'light_00001.fits'
static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(.*?)'.*?'(.*?)'").expect("static regex"));

/// Parse the contents of a conversion file. Lines that do not carry two
/// quoted paths are skipped.
pub fn parse_conversion_file(contents: &str) -> Vec<ConversionEntry> {
    contents
        .lines()
        .filter_map(|line| {
            let caps = ENTRY_RE.captures(line)?;
            Some(ConversionEntry {
                source: PathBuf::from(&caps[1]),
                destination: PathBuf::from(&caps[2]),
            })
        })
        .collect()
}

/// Read and parse a conversion file from disk.
pub async fn read_conversion_file(path: &Path) -> std::io::Result<Vec<ConversionEntry>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_conversion_file(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let contents = "'IMG_0001.CR2' -> 'light_00001.fits'\n'IMG_0002.CR2' -> 'light_00002.fits'\n";
        let entries = parse_conversion_file(contents);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, PathBuf::from("IMG_0001.CR2"));
        assert_eq!(entries[0].destination, PathBuf::from("light_00001.fits"));
        assert_eq!(entries[1].destination, PathBuf::from("light_00002.fits"));
    }

    #[test]
    fn test_skips_non_entry_lines() {
        let contents = "# conversion of 2 files\n'a.tif' -> 'seq_00001.fits'\n\n";
        let entries = parse_conversion_file(contents);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, PathBuf::from("a.tif"));
    }

    #[test]
    fn test_paths_with_spaces() {
        let entries = parse_conversion_file("'my frames/IMG 1.CR2' -> 'light_00001.fits'");
        assert_eq!(entries[0].source, PathBuf::from("my frames/IMG 1.CR2"));
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("light_conversion.txt");
        tokio::fs::write(&path, "'a.cr2' -> 'light_00001.fits'\n")
            .await
            .unwrap();
        let entries = read_conversion_file(&path).await.unwrap();
        assert_eq!(entries.len(), 1);
    }
}

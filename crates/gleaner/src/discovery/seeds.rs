//! Curated seed lists in Markdown.
//!
//! An awesome-list style README links every entry as `* [name](url)`. Entries
//! after the line starting with `Tutorials` are learning material, not
//! repositories, so parsing stops there.

use crate::platform::{InvalidRepoId, RepoId};

/// Line prefix that ends the list of entries.
pub const SEED_SENTINEL: &str = "Tutorials";

const ENTRY_PREFIX: &str = "* [";

/// One linked entry of a seed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub name: String,
    pub url: String,
}

impl Seed {
    /// Repository identifier from the last two segments of the URL.
    pub fn repo_id(&self) -> Result<RepoId, InvalidRepoId> {
        RepoId::parse(&self.url)
    }
}

/// Parse every `* [name](url)` line before the sentinel, in order.
///
/// Lines that do not look like entries are skipped.
pub fn parse_seed_list(text: &str) -> Vec<Seed> {
    text.lines()
        .take_while(|line| !line.starts_with(SEED_SENTINEL))
        .filter_map(parse_entry)
        .collect()
}

fn parse_entry(line: &str) -> Option<Seed> {
    let rest = line.strip_prefix(ENTRY_PREFIX)?;
    let (name, rest) = rest.split_once(']')?;
    let rest = rest.strip_prefix('(')?;
    let (url, _) = rest.split_once(')')?;

    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    Some(Seed {
        name: name.trim().to_string(),
        url: url.to_string(),
    })
}

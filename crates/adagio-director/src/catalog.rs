//! The snippets available on disk and how the next ones are chosen.

use adagio_core::{Error, Mood, Result, SnippetName};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Chooses the snippets to queue for a mood.
///
/// `reference` is a snippet already in the program; selectors use it to pick
/// material that follows on from what is playing.
pub trait SnippetSelector {
    fn select(&mut self, mood: Mood, reference: Option<&str>) -> Result<Vec<String>>;
}

/// Snippet indices grouped by piece.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetCatalog {
    /// Piece title to its snippet indices, ascending.
    pieces: BTreeMap<String, Vec<u32>>,
}

impl SnippetCatalog {
    /// Catalog every correctly named snippet in `dir`.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!("Skipping non UTF-8 file name {name:?}"),
            }
        }

        let catalog = Self::from_names(names);
        debug!(
            "Scanned {}: {} snippets across {} pieces",
            dir.display(),
            catalog.len(),
            catalog.piece_count()
        );
        Ok(catalog)
    }

    /// Catalog the names that follow the snippet naming convention.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pieces: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for name in names {
            if let Some(snippet) = SnippetName::parse(name.as_ref()) {
                pieces.entry(snippet.piece).or_default().push(snippet.index);
            }
        }
        for indices in pieces.values_mut() {
            indices.sort_unstable();
            indices.dedup();
        }
        Self { pieces }
    }

    /// Total number of snippets.
    pub fn len(&self) -> usize {
        self.pieces.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Piece titles in sorted order.
    pub fn pieces(&self) -> impl Iterator<Item = &str> {
        self.pieces.keys().map(String::as_str)
    }

    pub fn contains_piece(&self, piece: &str) -> bool {
        self.pieces.contains_key(piece)
    }

    /// Up to `count` snippets of `piece` after `after`.
    pub fn continuation(&self, after: &SnippetName, count: usize) -> Vec<SnippetName> {
        self.pieces
            .get(&after.piece)
            .map(|indices| {
                indices
                    .iter()
                    .filter(|&&index| index > after.index)
                    .take(count)
                    .map(|&index| SnippetName::new(after.piece.clone(), index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first `count` snippets of `piece`.
    pub fn opening(&self, piece: &str, count: usize) -> Vec<SnippetName> {
        self.pieces
            .get(piece)
            .map(|indices| {
                indices
                    .iter()
                    .take(count)
                    .map(|&index| SnippetName::new(piece, index))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Selects from a [`SnippetCatalog`].
///
/// A reference snippet whose piece suits the mood is continued. Otherwise the
/// selector rotates through the pieces assigned to the mood, or through every
/// piece when the mood has none assigned, and starts the next one from its
/// first snippet.
#[derive(Debug, Clone)]
pub struct CatalogSelector {
    catalog: SnippetCatalog,
    assignments: HashMap<Mood, Vec<String>>,
    batch_size: usize,
    rotation: usize,
}

impl CatalogSelector {
    pub fn new(catalog: SnippetCatalog, batch_size: usize) -> Self {
        Self {
            catalog,
            assignments: HashMap::new(),
            batch_size: batch_size.max(1),
            rotation: 0,
        }
    }

    /// Mark `piece` as suitable for `mood`.
    #[must_use]
    pub fn assign(mut self, mood: Mood, piece: impl Into<String>) -> Self {
        self.assignments.entry(mood).or_default().push(piece.into());
        self
    }

    pub const fn catalog(&self) -> &SnippetCatalog {
        &self.catalog
    }

    /// Pieces that can be played for `mood`.
    fn candidates(&self, mood: Mood) -> Vec<&str> {
        let assigned: Vec<&str> = self
            .assignments
            .get(&mood)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|piece| self.catalog.contains_piece(piece))
            .collect();

        if assigned.is_empty() {
            self.catalog.pieces().collect()
        } else {
            assigned
        }
    }

    fn next_piece(&mut self, mood: Mood, avoid: Option<&str>) -> Option<String> {
        let candidates = self.candidates(mood);
        let fresh: Vec<&str> = candidates
            .iter()
            .copied()
            .filter(|&piece| Some(piece) != avoid)
            .collect();
        let pool = if fresh.is_empty() { candidates } else { fresh };
        if pool.is_empty() {
            return None;
        }

        let piece = pool[self.rotation % pool.len()].to_owned();
        self.rotation = self.rotation.wrapping_add(1);
        Some(piece)
    }
}

impl SnippetSelector for CatalogSelector {
    fn select(&mut self, mood: Mood, reference: Option<&str>) -> Result<Vec<String>> {
        let reference = reference.and_then(SnippetName::parse);

        if let Some(reference) = &reference {
            if self.candidates(mood).contains(&reference.piece.as_str()) {
                let next = self.catalog.continuation(reference, self.batch_size);
                if !next.is_empty() {
                    debug!("Continuing {} after snippet {}", reference.piece, reference.index);
                    return Ok(next.iter().map(SnippetName::file_name).collect());
                }
            }
        }

        let avoid = reference.as_ref().map(|r| r.piece.as_str());
        let piece = self
            .next_piece(mood, avoid)
            .ok_or_else(|| Error::Selection(format!("no snippets available for mood {mood}")))?;
        debug!("Starting {piece} for mood {mood}");

        Ok(self
            .catalog
            .opening(&piece, self.batch_size)
            .iter()
            .map(SnippetName::file_name)
            .collect())
    }
}

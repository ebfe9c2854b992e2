use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    rc::Rc,
};

use eyre::WrapErr;
use lru::LruCache;
use ratatui::text::Line;

use crate::highlight::{Highlighter, language_for};

/// Highlighted lines of one file, without any gutter markers
pub type Content = Rc<[Line<'static>]>;

/// Recently used highlighted files, keyed by filename.
///
/// Entries are never invalidated: a file edited on disk keeps its cached
/// rendering until it is evicted.
pub struct ContentCache {
    entries: LruCache<PathBuf, Content>,
    highlighter: Box<dyn Highlighter>,
}

impl ContentCache {
    pub fn new(capacity: usize, highlighter: Box<dyn Highlighter>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            highlighter,
        }
    }

    pub fn get(&mut self, filename: &Path) -> eyre::Result<Content> {
        if let Some(content) = self.entries.get(filename) {
            return Ok(Rc::clone(content));
        }

        tracing::debug!(filename = %filename.display(), "cache miss");
        let text = std::fs::read_to_string(filename)
            .wrap_err_with(|| format!("reading {}", filename.display()))?;
        let lines = self
            .highlighter
            .highlight(&text, language_for(filename))
            .wrap_err_with(|| format!("highlighting {}", filename.display()))?;
        let content: Content = lines.into();

        if let Some((evicted, _)) = self.entries.push(filename.to_path_buf(), Rc::clone(&content)) {
            tracing::debug!(evicted = %evicted.display(), "evicted from cache");
        }
        Ok(content)
    }

    pub fn contains(&self, filename: &Path) -> bool {
        self.entries.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn highlighter(&self) -> &dyn Highlighter {
        self.highlighter.as_ref()
    }
}

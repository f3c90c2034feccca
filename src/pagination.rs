//! Pagination utilities.
//!
//! Pages are fixed-size runs of whitespace-delimited words. Layout plays no
//! part: a page is whatever `page_size` consecutive words the document holds,
//! re-joined with single spaces, so a page is also the unit read aloud.

/// Default number of words on a page.
pub const DEFAULT_WORDS_PER_PAGE: usize = 300;
/// Smallest page size accepted from configuration.
pub const MIN_WORDS_PER_PAGE: usize = 10;
/// Largest page size accepted from configuration.
pub const MAX_WORDS_PER_PAGE: usize = 5000;

/// Split the provided text into pages of `page_size` words.
///
/// The final page may hold fewer words. Empty or whitespace-only text yields
/// no pages at all.
///
/// # Panics
///
/// Panics if `page_size` is zero.
pub fn paginate(text: &str, page_size: usize) -> Vec<String> {
    assert!(page_size > 0, "page size must be positive");

    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(page_size)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Clamp a configured page size into the supported range.
pub fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(MIN_WORDS_PER_PAGE, MAX_WORDS_PER_PAGE)
}

/// Ordered pages derived from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet {
    pages: Vec<String>,
}

impl PageSet {
    pub fn new(text: &str, page_size: usize) -> Self {
        let pages = paginate(text, page_size);
        tracing::debug!(pages = pages.len(), page_size, "Paginated document");
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.pages.len()
    }

    /// Validate a raw (possibly negative) index coming from a seek control.
    pub fn checked_index(&self, raw: i64) -> Option<usize> {
        usize::try_from(raw).ok().filter(|index| self.contains(*index))
    }

    /// Highest valid index, or 0 for an empty set (seek control upper bound).
    pub fn last_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }
}

//! Paged list with a selection that survives refreshes.

/// Stable identity of a list item across refreshes
pub trait Keyed {
    type Key: PartialEq;

    fn key(&self) -> Self::Key;
}

#[derive(Debug)]
pub struct SelectableList<T> {
    items: Vec<T>,
    selected: usize,
    per_page: usize,
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            per_page: 1,
        }
    }
}

impl<T: Keyed> SelectableList<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Swap in fresh items, keeping the selected item selected if it is still present
    pub fn replace(&mut self, items: Vec<T>) {
        let previous = self.selected().map(Keyed::key);
        self.items = items;
        self.selected = previous
            .and_then(|key| self.items.iter().position(|item| item.key() == key))
            .unwrap_or(0);
    }

    /// Select the item with `key`, returning whether it exists
    pub fn select(&mut self, key: &T::Key) -> bool {
        match self.items.iter().position(|item| item.key() == *key) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
    }

    /// Zero-based page holding the selection
    pub fn page(&self) -> usize {
        self.selected / self.per_page
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.per_page).max(1)
    }

    pub fn next_page(&mut self) {
        if self.page() + 1 < self.page_count() {
            self.selected = (self.page() + 1) * self.per_page;
        }
    }

    pub fn previous_page(&mut self) {
        if self.page() > 0 {
            self.selected = (self.page() - 1) * self.per_page;
        }
    }

    /// Items on the current page with their absolute index
    pub fn visible(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items
            .iter()
            .enumerate()
            .skip(self.page() * self.per_page)
            .take(self.per_page)
    }

    pub fn footer(&self) -> String {
        format!("page {} of {}", self.page() + 1, self.page_count())
    }
}

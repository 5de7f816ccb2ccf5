use crate::domain::entities::view::{ActiveFilters, SortDirection, SortSpec, ViewSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    SearchEditing,
    FilterOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: InteractionMode,
    pub search_term: String,
    pub search_fields: Vec<String>,
    pub filters: ActiveFilters,
    pub sort: Option<SortSpec>,
    pub page: i64,
    pub page_size: i64,
}

impl ViewState {
    pub fn new(search_fields: Vec<String>, page_size: i64) -> Self {
        Self {
            mode: InteractionMode::Idle,
            search_term: String::new(),
            search_fields,
            filters: ActiveFilters::new(),
            sort: None,
            page: 1,
            page_size,
        }
    }

    pub fn begin_search(&mut self) {
        self.mode = InteractionMode::SearchEditing;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    pub fn open_filter(&mut self) {
        self.mode = InteractionMode::FilterOpen;
    }

    /// Selecting the empty value clears the filter ("All").
    pub fn select_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key = key.into();
        if value.is_empty() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, value);
        }
        self.page = 1;
        self.mode = InteractionMode::Idle;
    }

    /// Clicking the active column flips direction; a new column starts ascending.
    pub fn toggle_sort(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.sort = match self.sort.take() {
            Some(current) if current.key == key => Some(SortSpec {
                key,
                direction: current.direction.flipped(),
            }),
            _ => Some(SortSpec {
                key,
                direction: SortDirection::Asc,
            }),
        };
    }

    pub fn go_to_page(&mut self, page: i64) {
        self.page = page;
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn sync_page(&mut self, clamped_page: usize) {
        self.page = i64::try_from(clamped_page).unwrap_or(i64::MAX);
    }

    pub fn finish_interaction(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    pub fn to_spec(&self) -> ViewSpec {
        ViewSpec {
            search_term: self.search_term.clone(),
            search_fields: self.search_fields.clone(),
            filters: self.filters.clone(),
            sort: self.sort.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

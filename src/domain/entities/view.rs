use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Filter key to selected value. An empty value stands for "All".
pub type ActiveFilters = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSpec {
    pub search_term: String,
    pub search_fields: Vec<String>,
    pub filters: ActiveFilters,
    pub sort: Option<SortSpec>,
    /// 1-indexed; out of range values are clamped.
    pub page: i64,
    pub page_size: i64,
}

impl ViewSpec {
    pub fn new(page_size: i64) -> Self {
        Self {
            search_term: String::new(),
            search_fields: Vec::new(),
            filters: ActiveFilters::new(),
            sort: None,
            page: 1,
            page_size,
        }
    }

    pub fn search<I, S>(mut self, term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_term = term.into();
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult<T> {
    pub items: Vec<T>,
    /// Count after search and filter, before paging.
    pub total_items: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> ViewResult<T> {
    /// Badge text such as `Showing 3-4 of 9`.
    pub fn summary(&self) -> String {
        if self.items.is_empty() {
            return format!("Showing 0 of {}", self.total_items);
        }
        let first = (self.page - 1) * self.page_size + 1;
        let last = first + self.items.len() - 1;
        format!("Showing {first}-{last} of {}", self.total_items)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

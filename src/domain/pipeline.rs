use std::borrow::Cow;

use thiserror::Error;
use tracing::trace;

use crate::domain::collation::{compare_natural, fold_case};
use crate::domain::entities::record::FieldAccessor;
use crate::domain::entities::view::{ActiveFilters, SortDirection, ViewResult, ViewSpec};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DataViewPipeline<A> {
    accessor: A,
}

impl<A> DataViewPipeline<A> {
    pub fn new(accessor: A) -> Self {
        Self { accessor }
    }

    pub fn compute_view<T>(
        &self,
        records: &[T],
        spec: &ViewSpec,
    ) -> Result<ViewResult<T>, ViewError>
    where
        T: Clone,
        A: FieldAccessor<T>,
    {
        let page_size = validate_page_size(spec.page_size)?;

        let searched = self.apply_search(records, &spec.search_term, &spec.search_fields);
        let filtered = self.apply_filters_within(searched, &spec.filters, records);
        let total_items = filtered.len();
        let sorted = match &spec.sort {
            Some(sort) => self.apply_sort(filtered, &sort.key, sort.direction),
            None => filtered,
        };
        let page = paginate(&sorted, spec.page, spec.page_size)?;

        trace!(
            input = records.len(),
            total_items,
            page = page.page,
            total_pages = page.total_pages,
            "computed view"
        );

        Ok(ViewResult {
            items: page.items.into_iter().map(|record| (*record).clone()).collect(),
            total_items,
            total_pages: page.total_pages,
            page: page.page,
            page_size,
        })
    }

    pub fn apply_search<'r, T, I>(&self, records: I, term: &str, fields: &[String]) -> Vec<&'r T>
    where
        I: IntoIterator<Item = &'r T>,
        A: FieldAccessor<T>,
        T: 'r,
    {
        let term = term.trim();
        if term.is_empty() {
            return records.into_iter().collect();
        }
        let needle = fold_case(term);

        records
            .into_iter()
            .filter(|record| {
                fields.iter().any(|field| {
                    self.accessor
                        .field_text(record, field)
                        .is_some_and(|value| fold_case(&value).contains(&needle))
                })
            })
            .collect()
    }

    /// Filter keys that no record in `records` carries are ignored.
    pub fn apply_filters<'r, T, I>(&self, records: I, filters: &ActiveFilters) -> Vec<&'r T>
    where
        I: IntoIterator<Item = &'r T>,
        A: FieldAccessor<T>,
        T: 'r,
    {
        let records: Vec<&'r T> = records.into_iter().collect();
        let active = self.active_filters(records.iter().copied(), filters);
        self.retain_matching(records, &active)
    }

    /// Like [`Self::apply_filters`], but a key counts as known when any record
    /// of `universe` carries it. Pass the pre-search collection when chaining.
    pub fn apply_filters_within<'r, T, I>(
        &self,
        records: I,
        filters: &ActiveFilters,
        universe: &[T],
    ) -> Vec<&'r T>
    where
        I: IntoIterator<Item = &'r T>,
        A: FieldAccessor<T>,
        T: 'r,
    {
        let active = self.active_filters(universe, filters);
        self.retain_matching(records.into_iter().collect(), &active)
    }

    fn active_filters<'f, 'u, T, U>(
        &self,
        universe: U,
        filters: &'f ActiveFilters,
    ) -> Vec<(&'f str, &'f str)>
    where
        U: IntoIterator<Item = &'u T> + Clone,
        A: FieldAccessor<T>,
        T: 'u,
    {
        filters
            .iter()
            .filter(|(_, expected)| !expected.is_empty())
            .filter(|(key, _)| self.is_known_key(universe.clone(), key))
            .map(|(key, expected)| (key.as_str(), expected.as_str()))
            .collect()
    }

    fn retain_matching<'r, T>(&self, records: Vec<&'r T>, active: &[(&str, &str)]) -> Vec<&'r T>
    where
        A: FieldAccessor<T>,
    {
        if active.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|record| {
                active.iter().all(|(key, expected)| {
                    self.accessor
                        .field_text(record, key)
                        .is_some_and(|value| value == *expected)
                })
            })
            .collect()
    }

    // Missing values sort as empty.
    pub fn apply_sort<'r, T>(
        &self,
        records: Vec<&'r T>,
        key: &str,
        direction: SortDirection,
    ) -> Vec<&'r T>
    where
        A: FieldAccessor<T>,
    {
        let mut keyed: Vec<(Cow<'r, str>, &'r T)> = records
            .into_iter()
            .map(|record| {
                let value = self
                    .accessor
                    .field_text(record, key)
                    .unwrap_or(Cow::Borrowed(""));
                (value, record)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| match direction {
            SortDirection::Asc => compare_natural(a, b),
            SortDirection::Desc => compare_natural(b, a),
        });

        keyed.into_iter().map(|(_, record)| record).collect()
    }

    /// Distinct values of `field` behind the empty "All" option.
    pub fn filter_options<T>(&self, records: &[T], field: &str) -> Vec<String>
    where
        A: FieldAccessor<T>,
    {
        let mut values: Vec<String> = records
            .iter()
            .filter_map(|record| self.accessor.field_text(record, field))
            .filter(|value| !value.is_empty())
            .map(Cow::into_owned)
            .collect();
        values.sort_by(|a, b| compare_natural(a, b));
        values.dedup();

        let mut options = Vec::with_capacity(values.len() + 1);
        options.push(String::new());
        options.extend(values);
        options
    }

    fn is_known_key<'u, T, U>(&self, universe: U, key: &str) -> bool
    where
        U: IntoIterator<Item = &'u T>,
        A: FieldAccessor<T>,
        T: 'u,
    {
        universe
            .into_iter()
            .any(|record| self.accessor.field_text(record, key).is_some())
    }
}

pub fn paginate<T>(records: &[T], page: i64, page_size: i64) -> Result<Page<&T>, ViewError> {
    let page_size = validate_page_size(page_size)?;
    let total_pages = records.len().div_ceil(page_size).max(1);
    let page = usize::try_from(page.max(1)).unwrap_or(usize::MAX).min(total_pages);

    let start = (page - 1) * page_size;
    let end = start.saturating_add(page_size).min(records.len());
    let items = records.get(start..end).unwrap_or_default().iter().collect();

    Ok(Page {
        items,
        page,
        total_pages,
    })
}

fn validate_page_size(page_size: i64) -> Result<usize, ViewError> {
    if page_size <= 0 {
        return Err(ViewError::InvalidArgument(format!(
            "page_size must be greater than zero, got {page_size}"
        )));
    }
    usize::try_from(page_size)
        .map_err(|_| ViewError::InvalidArgument(format!("page_size out of range: {page_size}")))
}

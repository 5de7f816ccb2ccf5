pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod ui;
pub mod usecase;

pub use domain::entities::record::{FieldAccessor, FieldValue, FnAccessor, Record, RecordFields};
pub use domain::entities::view::{ActiveFilters, SortDirection, SortSpec, ViewResult, ViewSpec};
pub use domain::pipeline::{paginate, DataViewPipeline, Page, ViewError};
pub use usecase::ports::source::{RecordBatch, RecordSource, SourceError};

#[cfg(test)]
mod tests;

pub mod collation;
pub mod entities;
pub mod pipeline;

pub mod export_service;
pub mod view_service;

pub mod analysis_service;
pub mod analysis_store;
pub mod csv_analyzer;

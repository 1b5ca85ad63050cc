pub mod chart_service;
pub mod dashboard_service;
pub mod export_service;
pub mod indicators;
pub mod ingestion;
pub mod session_store;
pub mod stats_service;

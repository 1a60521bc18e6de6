pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod extract;
pub mod llm;
pub mod models;
pub mod scoring;
pub mod store;

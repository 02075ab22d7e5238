pub mod search_handlers;
pub mod search_models;
pub mod search_service;

pub use search_service::SearchService;

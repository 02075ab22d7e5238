pub mod feature_handlers;
pub mod feature_models;
pub mod feature_repository;
pub mod feature_service;

pub use feature_repository::FeatureRequestRepository;
pub use feature_service::FeatureRequestService;

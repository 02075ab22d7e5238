pub mod api_key;
pub mod cookies;
pub mod jwt;
pub mod oauth;
pub mod password;

pub mod auth_dto;
pub mod auth_handlers;
pub mod auth_models;
pub mod auth_repository;
pub mod auth_service;
pub mod token_cleanup;

pub use oauth::create_oauth_client;
pub use token_cleanup::start_token_cleanup;

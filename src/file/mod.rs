pub mod file_handlers;
pub mod file_models;
pub mod file_repository;
pub mod file_service;

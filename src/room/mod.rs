pub mod room_dto;
pub mod room_handlers;
pub mod room_models;
pub mod room_repository;
pub mod room_service;

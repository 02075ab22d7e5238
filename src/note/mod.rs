pub mod note_handlers;
pub mod note_models;
pub mod note_repository;

pub use note_repository::NoteRepository;

pub mod auth;
pub mod db;
pub mod error;
pub mod feature_request;
pub mod file;
pub mod message;
pub mod middleware;
pub mod note;
pub mod notification;
pub mod room;
pub mod routes;
pub mod search;
pub mod state;
pub mod storage;
pub mod task;
pub mod user;
pub mod websocket;

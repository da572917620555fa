pub mod handler;
pub mod models;
pub mod progress;
pub mod repository;
pub mod service;

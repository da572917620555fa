pub mod editor;
pub mod handler;
pub mod models;
pub mod repository;
pub mod service;

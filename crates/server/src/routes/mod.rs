pub mod admin;
pub mod config;
pub mod entry;
pub mod gallery;
pub mod generation;
pub mod health;
pub mod submissions;
pub mod uploads;
pub mod workshops;

pub mod admin;
pub mod gallery_item;
pub mod ids;
pub mod session;
pub mod submission;
pub mod webhook_outbox;
pub mod workshop;

pub mod admin;
pub mod gallery_item;
pub mod submission;
pub mod webhook_outbox;
pub mod workshop;
pub mod workshop_session;

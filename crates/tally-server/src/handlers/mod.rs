//! Request handlers, one module per surface.

pub mod health;
pub mod pages;
pub mod tasks;

// Dashboard composition root: session lifecycle, per-selection views, HTTP handlers.
// Feeds are reached only through the controller; handlers never call feeds::* directly.

pub mod controller;
pub mod handlers;
pub mod page;
pub mod sessions;

#[cfg(test)]
pub mod fixtures;

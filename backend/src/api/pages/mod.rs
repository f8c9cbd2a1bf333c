//! Module for the HTML pages served at the site root.

pub mod handlers;
pub mod routes;

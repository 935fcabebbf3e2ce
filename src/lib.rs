//! recipe_hub: recipe search web app
//!
//! Loads a recipe table and a review table from CSV at startup, then serves
//! HTML pages for searching recipes and reading reviews to signed-in users.
//!
//! - Dataset: Arrow CSV reader into in-memory, insertion-ordered tables
//! - Auth: bcrypt password hashes + JWT-signed server-side sessions
//! - Web: Axum handlers behind a session-checking middleware

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
// Offline dataset cleanup, only reachable from the `preprocess` binary
pub mod preprocess;
pub mod query;
pub mod recommend;
// HTTP layer: routes, session gate, handlers
pub mod rest;
pub mod storage;
pub mod views;

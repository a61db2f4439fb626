//! Library Loan Server
//!
//! Books, borrowers and the borrow/return workflow over a shared store.
//! The binary in `main.rs` wires these modules into an HTTP server.

pub mod auth;
pub mod book_service;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod state;
pub mod store;
pub mod user_service;
pub mod validation;

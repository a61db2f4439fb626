//! API handlers for the library server

pub mod auth;
pub mod book;
pub mod health;
pub mod loan;
pub mod user;

pub use auth::*;
pub use book::*;
pub use health::*;
pub use loan::*;
pub use user::*;

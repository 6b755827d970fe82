//! User accounts, as far as team membership needs them.
//!
//! Team storage traits live in [`crate::teams`]. Both are implemented by the
//! same store so account creation can reconcile invitations atomically.

mod user;

pub use user::{CreateUser, CreatedUser, User, UserRepository};

//! Google Calendar provider for lushsync.
//!
//! Credentials and tokens live on disk (paths come from the caller's
//! configuration, defaulting to `~/.config/lushsync/google/`):
//!   credentials.json  - OAuth client id/secret from the Google console
//!   token.json        - cached access/refresh token pair

pub mod api;
pub mod auth;
pub mod config;

pub use api::CalendarWriter;
pub use config::{AccountTokens, GoogleConfig, GoogleCredentials};

//! Session handling for the dashboard
//!
//! The backend issues and validates the tokens. This module only reads the
//! token payload to decide what a staff member may open, keeps the session
//! cookies and gates the pages.

pub mod middleware;
pub mod role;
pub mod session;
pub mod token;

pub use middleware::{BearerToken, CurrentUser, login_redirect, redirect_signed_in, require_staff};
pub use role::Role;
pub use token::{Claims, decode_claims};

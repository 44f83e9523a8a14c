//! Application services: the transactional operations behind the HTTP API.
//!
//! Services borrow the pool, configuration and clock from `AppState`; they
//! validate input, authorize the actor and talk to the store. HTTP concerns
//! (status codes, envelopes) stay in `api`.

pub mod auth;
pub mod members;

pub use auth::{
    generate_token, hash_password, hash_token, verify_password, AuthService, AuthSession,
    LoginOutcome,
};
pub use members::{MemberPage, MemberService, PageMeta};

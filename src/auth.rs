//! Application credentials and access-token models.

pub mod credential;
pub mod token;

pub use credential::*;
pub use token::{secret::*, *};

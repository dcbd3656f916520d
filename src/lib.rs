//! Manage multiple Git/SSH identities and switch the globally active one.
//!
//! [`manager::ProfileManager`] keeps three stores consistent: the profile
//! registry, managed blocks in the SSH client config, and the global git
//! identity settings.

pub mod alias;
pub mod config;
pub mod error;
pub mod git;
pub mod import;
pub mod keygen;
pub mod manager;
pub mod profile;
pub mod ssh_config;
pub mod storage;
pub mod validation;

pub use error::AppError;
pub use manager::{ProfileManager, ProfileUpdate};
pub use profile::{Profile, Registry};

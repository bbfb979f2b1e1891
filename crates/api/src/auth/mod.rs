//! Authentication primitives.
//!
//! - [`password`]: Argon2id hashing and verification of account passwords.
//! - [`jwt`]: signed access tokens carried as `Authorization: Bearer`.

pub mod jwt;
pub mod password;

//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - PIN/password credential hashing (Argon2id, peppered)
//! - Cookie management

pub mod cookie;
pub mod crypto;
pub mod pin;

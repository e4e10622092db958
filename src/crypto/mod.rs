//! Hash primitive: the [`SecretHasher`] seam and its Argon2id implementation.

pub mod argon2id;
pub mod hasher;

pub use argon2id::{Argon2Hasher, embedded_rounds};
pub use hasher::{Salt, SecretHasher};

//! Strongly-typed identifiers used across the protocol.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when parsing an identifier from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The value was not the expected 64 hex characters.
    #[error("invalid {0}: expected 64 lowercase hex characters")]
    Malformed(&'static str),
}

/// Identifier of a published record (32 bytes, lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

/// Public key of a participant (32 bytes, lowercase hex).
///
/// Both requesters and service providers are identified this way; the
/// protocol has no other notion of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pubkey(String);

macro_rules! impl_hex_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap an already-validated hex string.
            ///
            /// Records fetched from relays carry ids validated by the
            /// transport layer; use `FromStr` for untrusted text.
            pub fn new(hex: impl Into<String>) -> Self {
                Self(hex.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ok = s.len() == 64
                    && s.bytes()
                        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
                if ok {
                    Ok(Self(s.to_owned()))
                } else {
                    Err(IdError::Malformed($name))
                }
            }
        }
    };
}

impl_hex_newtype!(EventId, "event id");
impl_hex_newtype!(Pubkey, "pubkey");

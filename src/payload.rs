//! The record distributed by the root rank.
//!
//! # Wire format
//!
//! A [`Payload`] travels as a single `MPI_UINT8_T` buffer holding its bincode
//! 1.x encoding with default options: fields in declaration order, the string
//! as a little-endian `u64` byte length followed by UTF-8 bytes, the numbers as
//! a `u64` element count followed by little-endian `i64` values.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Message text carried by the greeting payload.
pub const GREETING_MESSAGE: &str = "Hello from rank 0!";

/// Numbers carried by the greeting payload.
pub const GREETING_NUMBERS: [i64; 5] = [1, 2, 3, 4, 5];

/// Structured data sent from the root to every other rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Free-form text.
    pub message: String,
    /// Ordered integers, delivered unchanged.
    pub numbers: Vec<i64>,
}

impl Payload {
    /// Build a payload from its parts.
    pub fn new(message: impl Into<String>, numbers: impl Into<Vec<i64>>) -> Self {
        Payload {
            message: message.into(),
            numbers: numbers.into(),
        }
    }

    /// The payload the greeter distributes from rank 0.
    pub fn greeting() -> Self {
        Payload::new(GREETING_MESSAGE, GREETING_NUMBERS)
    }

    /// The greeting as sent by `root`; identical to [`Payload::greeting`]
    /// for rank 0.
    pub fn greeting_from(root: i32) -> Self {
        if root == 0 {
            return Payload::greeting();
        }
        Payload::new(format!("Hello from rank {root}!"), GREETING_NUMBERS)
    }

    /// Encode for transmission.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a received buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn greeting_content() {
        let payload = Payload::greeting();
        assert_eq!(payload.message, "Hello from rank 0!");
        assert_eq!(payload.numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn greeting_names_its_root() {
        assert_eq!(Payload::greeting_from(0), Payload::greeting());
        assert_eq!(Payload::greeting_from(3).message, "Hello from rank 3!");
        assert_eq!(Payload::greeting_from(3).numbers, GREETING_NUMBERS.to_vec());
    }

    #[test]
    fn greeting_survives_encoding() {
        let payload = Payload::greeting();
        let bytes = payload.encode().unwrap();
        assert_eq!(Payload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn encoding_layout_is_stable() {
        let bytes = Payload::new("hi", [7]).encode().unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(b"hi");
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(&7i64.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn empty_numbers_are_preserved() {
        let payload = Payload::new("nothing to count", Vec::<i64>::new());
        let decoded = Payload::decode(&payload.encode().unwrap()).unwrap();
        assert!(decoded.numbers.is_empty());
        assert_eq!(decoded.message, "nothing to count");
    }

    #[test]
    fn truncated_buffer_is_a_codec_error() {
        let bytes = Payload::greeting().encode().unwrap();
        let err = Payload::decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }
}

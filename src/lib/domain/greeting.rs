use alloy::primitives::B256;
use thiserror::Error;

use crate::crypto::poseidon::hash_to_field;

/// Longest greeting that fits a `bytes32` with its NUL terminator.
pub const MAX_GREETING_BYTES: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GreetingCodecError {
    #[error("greeting must be at most {MAX_GREETING_BYTES} bytes, got {0}")]
    TooLong(usize),

    #[error("invalid bytes32 string: no null terminator")]
    MissingTerminator,

    #[error("invalid bytes32 string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// A short text greeting, as stored on-chain in a `bytes32` slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Greeting(String);

impl Greeting {
    /// Validate that `text` fits the on-chain encoding.
    pub fn new(text: impl Into<String>) -> Result<Self, GreetingCodecError> {
        let text = text.into();
        if text.len() > MAX_GREETING_BYTES {
            return Err(GreetingCodecError::TooLong(text.len()));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes right-padded with zeros.
    pub fn to_bytes32(&self) -> B256 {
        let mut padded = [0u8; 32];
        padded[..self.0.len()].copy_from_slice(self.0.as_bytes());
        B256::from(padded)
    }

    /// Decode a `bytes32` string: text up to the first NUL.
    /// The final byte must be NUL.
    pub fn from_bytes32(word: B256) -> Result<Self, GreetingCodecError> {
        let bytes = word.as_slice();
        if bytes[31] != 0 {
            return Err(GreetingCodecError::MissingTerminator);
        }
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(31);
        let text = std::str::from_utf8(&bytes[..len])?;
        Ok(Self(text.to_owned()))
    }

    /// The signal the proof attests to.
    /// signal_hash = keccak256(bytes32(greeting)) >> 8
    pub fn signal_hash(&self) -> B256 {
        hash_to_field(self.to_bytes32().as_slice())
    }
}

impl std::fmt::Display for Greeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An on-chain confirmation that some member posted a greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingEvent {
    pub greeting: String,
    /// Block the event was included in, when known.
    pub block_number: Option<u64>,
}

impl GreetingEvent {
    /// Decode the raw `NewGreeting` payload.
    pub fn decode(payload: B256, block_number: Option<u64>) -> Result<Self, GreetingCodecError> {
        let greeting = Greeting::from_bytes32(payload)?;
        Ok(Self {
            greeting: greeting.0,
            block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes32_layout() {
        let word = Greeting::new("Hi").unwrap().to_bytes32();
        assert_eq!(&word[..2], b"Hi");
        assert!(word[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_event_payload() {
        let word = Greeting::new("Hi").unwrap().to_bytes32();
        let event = GreetingEvent::decode(word, Some(7)).unwrap();
        assert_eq!(event.greeting, "Hi");
        assert_eq!(event.block_number, Some(7));
    }

    #[test]
    fn test_max_length_greeting() {
        let text = "a".repeat(MAX_GREETING_BYTES);
        let greeting = Greeting::new(text.clone()).unwrap();
        assert_eq!(Greeting::from_bytes32(greeting.to_bytes32()).unwrap().as_str(), text);
    }

    #[test]
    fn test_too_long_rejected() {
        let err = Greeting::new("a".repeat(32)).unwrap_err();
        assert_eq!(err, GreetingCodecError::TooLong(32));
    }

    #[test]
    fn test_missing_terminator_rejected() {
        let err = Greeting::from_bytes32(B256::repeat_byte(b'a')).unwrap_err();
        assert_eq!(err, GreetingCodecError::MissingTerminator);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut raw = [0u8; 32];
        raw[0] = 0xff;
        let err = Greeting::from_bytes32(B256::from(raw)).unwrap_err();
        assert!(matches!(err, GreetingCodecError::InvalidUtf8(_)));
    }

    #[test]
    fn test_signal_hash_depends_on_text() {
        let a = Greeting::new("Hello ZKU").unwrap();
        let b = Greeting::new("Hi").unwrap();
        assert_ne!(a.signal_hash(), b.signal_hash());
        assert_eq!(a.signal_hash()[0], 0);
    }
}

//! PIN/Password Credential Hashing and Verification
//!
//! Credential handling for the PIN-based roles (cashier, branch manager)
//! and the password flows that share the same hashing service:
//! - Argon2id hashing (memory-hard) with fixed cost parameters
//! - Server-side pepper appended before hashing
//! - Zeroization of sensitive data
//! - Legacy-digest detection for opportunistic hash migration
//!
//! ## Security Features
//! - Memory-hard hashing prevents GPU/ASIC attacks
//! - Zeroization prevents memory inspection attacks
//! - Verification never throws: malformed input is a failed match

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{constant_time_eq, sha256_hex};

// ============================================================================
// Constants
// ============================================================================

/// Minimum PIN length in digits
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum PIN length in digits
pub const MAX_PIN_LENGTH: usize = 8;

/// Minimum password length for password-based roles
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length for password-based roles
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Argon2id memory cost in KiB (64 MiB)
pub const ARGON2_M_COST_KIB: u32 = 64 * 1024;

/// Argon2id iteration count
pub const ARGON2_T_COST: u32 = 3;

/// Argon2id parallelism degree
pub const ARGON2_P_COST: u32 = 1;

/// Length of a legacy hex digest (SHA-256, unsalted, no pepper)
const LEGACY_DIGEST_LENGTH: usize = 64;

// ============================================================================
// Error Types
// ============================================================================

/// Credential policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinPolicyError {
    /// PIN is too short
    #[error("PIN must be at least {min} digits (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// PIN is too long
    #[error("PIN must be at most {max} digits (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// PIN contains a non-digit character
    #[error("PIN must contain digits only")]
    NonDigit,

    /// PIN is a single repeated digit (e.g., "1111")
    #[error("PIN cannot be a single repeated digit")]
    RepeatedDigit,

    /// PIN is an ascending or descending run (e.g., "1234", "8765")
    #[error("PIN cannot be a sequential run of digits")]
    SequentialRun,

    /// Secret is empty or whitespace only
    #[error("Secret cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Password is outside the allowed length range
    #[error("Password must be {min} to {max} characters (got {actual})")]
    PasswordLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    /// Secret contains invalid characters (control characters)
    #[error("Secret contains invalid control characters")]
    InvalidCharacter,
}

/// Credential hashing errors
#[derive(Debug, Error)]
pub enum PinHashError {
    /// Hashing operation failed
    #[error("Credential hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid credential hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text PIN (Zeroized on drop)
// ============================================================================

/// Clear text PIN or password with automatic memory zeroization
///
/// This type ensures that secret data is securely erased from memory
/// when the value is dropped, preventing memory inspection attacks.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPin(String);

impl ClearTextPin {
    /// Create a new clear text PIN with validation
    ///
    /// Validation rules:
    /// - 4 to 8 characters, ASCII digits only
    /// - Not a single repeated digit
    /// - Not an ascending or descending run
    ///
    /// Unicode is normalized using NFKC before validation, so fullwidth
    /// digits entered from some IMEs are accepted.
    pub fn new(raw: String) -> Result<Self, PinPolicyError> {
        let normalized: String = raw.nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(PinPolicyError::EmptyOrWhitespace);
        }

        let digit_count = trimmed.chars().count();
        if digit_count < MIN_PIN_LENGTH {
            return Err(PinPolicyError::TooShort {
                min: MIN_PIN_LENGTH,
                actual: digit_count,
            });
        }
        if digit_count > MAX_PIN_LENGTH {
            return Err(PinPolicyError::TooLong {
                max: MAX_PIN_LENGTH,
                actual: digit_count,
            });
        }

        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinPolicyError::NonDigit);
        }

        if is_repeated_digit(trimmed) {
            return Err(PinPolicyError::RepeatedDigit);
        }

        if is_sequential_run(trimmed) {
            return Err(PinPolicyError::SequentialRun);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Create a clear text password for password-based roles
    ///
    /// The password path shares the hashing service with PINs but applies
    /// a length policy instead of the digit policy.
    pub fn new_password(raw: String) -> Result<Self, PinPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PinPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH || char_count > MAX_PASSWORD_LENGTH {
            return Err(PinPolicyError::PasswordLength {
                min: MIN_PASSWORD_LENGTH,
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        for ch in normalized.chars() {
            if ch.is_control() && ch != ' ' && ch != '\t' {
                return Err(PinPolicyError::InvalidCharacter);
            }
        }

        Ok(Self(normalized))
    }

    /// Create for verification against a stored hash
    ///
    /// Applies NFKC normalization and trimming but no policy checks:
    /// stored credentials may predate the current policy, and the
    /// verification path must still match them.
    pub fn for_verification(raw: String) -> Self {
        let normalized: String = raw.nfkc().collect();
        Self(normalized.trim().to_string())
    }

    /// Create without validation (for testing or trusted input)
    #[cfg(test)]
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    /// Get the secret as bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPin").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// PIN Hash (Safe to store)
// ============================================================================

/// Hashed credential in PHC string format
///
/// Stores the Argon2id hash in PHC format, which includes the algorithm
/// identifier, version, parameters, salt, and hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PinHash {
    hash: String,
}

impl PinHash {
    /// Hash a clear text secret using Argon2id
    ///
    /// The server-side pepper, when provided, is appended to the secret
    /// bytes before hashing. Cost parameters are fixed (m=64 MiB, t=3,
    /// p=1) and tuned for the deployment hardware.
    ///
    /// Hashing is CPU- and memory-bound; callers must hash before opening
    /// any store transaction, never inside one.
    pub fn from_clear(pin: &ClearTextPin, pepper: Option<&[u8]>) -> Result<Self, PinHashError> {
        let secret_bytes = peppered_bytes(pin.as_bytes(), pepper);

        // Random salt (128 bits = 16 bytes)
        let salt = SaltString::generate(OsRng);

        let hash = argon2()
            .hash_password(&secret_bytes, &salt)
            .map_err(|e| PinHashError::HashingFailed(e.to_string()))?;

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Create from PHC string (e.g., from the store)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PinHashError> {
        let hash = s.into();

        // Validate it's a valid PHC string
        PasswordHash::new(&hash).map_err(|_| PinHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a secret against this hash
    ///
    /// Never errors: a malformed stored hash or any internal failure
    /// during verification is treated as a failed match.
    ///
    /// ## Arguments
    /// * `pin` - The clear text secret to verify
    /// * `pepper` - Must match the pepper used during hashing
    pub fn verify(&self, pin: &ClearTextPin, pepper: Option<&[u8]>) -> bool {
        let secret_bytes = peppered_bytes(pin.as_bytes(), pepper);

        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // Argon2 uses constant-time comparison internally
        argon2().verify_password(&secret_bytes, &parsed_hash).is_ok()
    }

    /// Check whether this hash uses the current algorithm
    pub fn is_modern(&self) -> bool {
        is_modern_hash(&self.hash)
    }
}

impl fmt::Debug for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinHash").field("hash", &"[HASH]").finish()
    }
}

// ============================================================================
// Legacy Digest Migration
// ============================================================================

/// Check if a stored value uses the current algorithm's encoded format
pub fn is_modern_hash(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

/// Check if a stored value is a legacy digest
///
/// The legacy scheme stored a fixed-length lowercase hex SHA-256 digest
/// with no salt and no pepper.
pub fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == LEGACY_DIGEST_LENGTH
        && stored
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Verify a secret against a legacy hex digest
///
/// Constant-time comparison; the caller is expected to re-hash under the
/// modern scheme and persist the upgrade when this returns true.
pub fn verify_legacy(pin: &ClearTextPin, stored: &str) -> bool {
    if !is_legacy_digest(stored) {
        return false;
    }
    let digest = sha256_hex(pin.as_bytes());
    constant_time_eq(digest.as_bytes(), stored.as_bytes())
}

/// Compute a legacy digest (for migration tests and backfill tooling)
pub fn legacy_digest(secret: &str) -> String {
    sha256_hex(secret.as_bytes())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Argon2id instance with the fixed cost parameters
fn argon2() -> Argon2<'static> {
    let params = Params::new(ARGON2_M_COST_KIB, ARGON2_T_COST, ARGON2_P_COST, None)
        .expect("fixed Argon2 parameters are valid");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Append the pepper to the secret bytes, if configured
fn peppered_bytes(secret: &[u8], pepper: Option<&[u8]>) -> Vec<u8> {
    match pepper {
        Some(p) => {
            let mut combined = secret.to_vec();
            combined.extend_from_slice(p);
            combined
        }
        None => secret.to_vec(),
    }
}

/// Check for a single repeated digit (e.g., "0000")
fn is_repeated_digit(pin: &str) -> bool {
    let mut chars = pin.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

/// Check for ascending or descending digit runs (e.g., "1234", "9876")
fn is_sequential_run(pin: &str) -> bool {
    let digits: Vec<i16> = pin.chars().filter_map(|c| c.to_digit(10)).map(|d| d as i16).collect();

    if digits.len() < 2 {
        return false;
    }

    let ascending = digits.windows(2).all(|w| w[1] - w[0] == 1);
    let descending = digits.windows(2).all(|w| w[0] - w[1] == 1);

    ascending || descending
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_too_short() {
        let result = ClearTextPin::new("821".to_string());
        assert!(matches!(result, Err(PinPolicyError::TooShort { .. })));
    }

    #[test]
    fn test_pin_too_long() {
        let result = ClearTextPin::new("482119473".to_string());
        assert!(matches!(result, Err(PinPolicyError::TooLong { .. })));
    }

    #[test]
    fn test_pin_non_digit() {
        let result = ClearTextPin::new("12a4".to_string());
        assert!(matches!(result, Err(PinPolicyError::NonDigit)));
    }

    #[test]
    fn test_pin_repeated_digit() {
        let result = ClearTextPin::new("7777".to_string());
        assert!(matches!(result, Err(PinPolicyError::RepeatedDigit)));
    }

    #[test]
    fn test_pin_sequential_run() {
        assert!(matches!(
            ClearTextPin::new("1234".to_string()),
            Err(PinPolicyError::SequentialRun)
        ));
        assert!(matches!(
            ClearTextPin::new("8765".to_string()),
            Err(PinPolicyError::SequentialRun)
        ));
    }

    #[test]
    fn test_pin_empty() {
        let result = ClearTextPin::new("".to_string());
        assert!(matches!(result, Err(PinPolicyError::EmptyOrWhitespace)));
    }

    #[test]
    fn test_valid_pin() {
        assert!(ClearTextPin::new("4821".to_string()).is_ok());
        assert!(ClearTextPin::new("90817263".to_string()).is_ok());
    }

    #[test]
    fn test_fullwidth_digits_normalized() {
        // NFKC maps fullwidth digits to ASCII
        let result = ClearTextPin::new("４８２１".to_string());
        assert!(result.is_ok());
    }

    #[test]
    fn test_password_policy() {
        assert!(ClearTextPin::new_password("correct horse battery".to_string()).is_ok());
        assert!(matches!(
            ClearTextPin::new_password("short".to_string()),
            Err(PinPolicyError::PasswordLength { .. })
        ));
        assert!(matches!(
            ClearTextPin::new_password("   ".to_string()),
            Err(PinPolicyError::EmptyOrWhitespace)
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        let hashed = PinHash::from_clear(&pin, None).unwrap();

        // Correct PIN should verify
        assert!(hashed.verify(&pin, None));

        // Wrong PIN should not verify
        let wrong = ClearTextPin::new_unchecked("4822".to_string());
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        let pepper = b"server_side_pepper";
        let hashed = PinHash::from_clear(&pin, Some(pepper)).unwrap();

        // Correct PIN with correct pepper
        assert!(hashed.verify(&pin, Some(pepper)));

        // Correct PIN without pepper should fail
        assert!(!hashed.verify(&pin, None));

        // Correct PIN with wrong pepper should fail
        assert!(!hashed.verify(&pin, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        let hashed = PinHash::from_clear(&pin, None).unwrap();

        let phc_string = hashed.as_phc_string().to_string();
        assert!(phc_string.starts_with("$argon2id$"));
        let restored = PinHash::from_phc_string(phc_string).unwrap();

        assert!(restored.verify(&pin, None));
    }

    #[test]
    fn test_fixed_cost_parameters_encoded() {
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        let hashed = PinHash::from_clear(&pin, None).unwrap();
        let phc = hashed.as_phc_string();
        assert!(phc.contains("m=65536"));
        assert!(phc.contains("t=3"));
        assert!(phc.contains("p=1"));
    }

    #[test]
    fn test_invalid_phc_string() {
        let result = PinHash::from_phc_string("not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_never_errors_on_malformed_hash() {
        // from_phc_string rejects malformed input, but verify on a value
        // smuggled in from the store must still return false, not panic.
        let stored = PinHash {
            hash: "$argon2id$garbage".to_string(),
        };
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        assert!(!stored.verify(&pin, None));
    }

    #[test]
    fn test_is_modern_hash() {
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        let hashed = PinHash::from_clear(&pin, None).unwrap();
        assert!(is_modern_hash(hashed.as_phc_string()));
        assert!(hashed.is_modern());
        assert!(!is_modern_hash(&legacy_digest("4821")));
    }

    #[test]
    fn test_is_legacy_digest() {
        assert!(is_legacy_digest(&legacy_digest("4821")));
        assert!(!is_legacy_digest("$argon2id$v=19$..."));
        assert!(!is_legacy_digest("abcdef"));
        // Uppercase hex is not the legacy format
        assert!(!is_legacy_digest(&legacy_digest("4821").to_uppercase()));
    }

    #[test]
    fn test_verify_legacy() {
        let stored = legacy_digest("4821");
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        assert!(verify_legacy(&pin, &stored));

        let wrong = ClearTextPin::new_unchecked("4822".to_string());
        assert!(!verify_legacy(&wrong, &stored));
    }

    #[test]
    fn test_debug_redaction() {
        let pin = ClearTextPin::new_unchecked("4821".to_string());
        let debug_output = format!("{:?}", pin);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("4821"));

        let hashed = PinHash::from_clear(&pin, None).unwrap();
        let debug_output = format!("{:?}", hashed);
        assert!(debug_output.contains("HASH"));
    }
}

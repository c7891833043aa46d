//! Source of phone verification codes.

use rand::Rng;

use crate::domain::VerificationCode;

/// Produces six-digit verification codes.
#[cfg_attr(test, mockall::automock)]
pub trait VerificationCodeSource: Send + Sync {
    /// Draw a new code.
    fn generate(&self) -> VerificationCode;
}

/// Uniformly random codes from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomVerificationCodes;

impl VerificationCodeSource for RandomVerificationCodes {
    fn generate(&self) -> VerificationCode {
        VerificationCode::from_digits(rand::thread_rng().gen_range(0..1_000_000))
    }
}

/// Always returns the same code.
#[derive(Debug, Clone)]
pub struct FixedVerificationCode(VerificationCode);

impl FixedVerificationCode {
    /// Use `value` (reduced to six digits) for every draw.
    pub fn new(value: u32) -> Self {
        Self(VerificationCode::from_digits(value))
    }
}

impl VerificationCodeSource for FixedVerificationCode {
    fn generate(&self) -> VerificationCode {
        self.0.clone()
    }
}

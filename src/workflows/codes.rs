// Single-use handoff codes for the two-party transfer handshake

use rand::Rng;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use subtle::ConstantTimeEq;

/// A numeric handoff code. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a code typed in by a user
    pub fn matches(&self, entered: &str) -> bool {
        self.0.as_bytes().ct_eq(entered.trim().as_bytes()).into()
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerificationCode(******)")
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of keeper/controller code pairs
pub trait CodeGenerator: Send + Sync {
    /// Returns two distinct codes: (keeper, controller)
    fn generate_pair(&self) -> (VerificationCode, VerificationCode);
}

/// Codes drawn from the thread-local CSPRNG
#[derive(Debug, Clone)]
pub struct RandomCodes {
    length: usize,
}

impl RandomCodes {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(4),
        }
    }

    fn one(&self) -> VerificationCode {
        let mut rng = rand::rng();
        let code: String = (0..self.length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        VerificationCode(code)
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CodeGenerator for RandomCodes {
    fn generate_pair(&self) -> (VerificationCode, VerificationCode) {
        let keeper = self.one();
        loop {
            let controller = self.one();
            if controller != keeper {
                return (keeper, controller);
            }
        }
    }
}

/// Hands out pre-agreed code pairs in order, then falls back to random codes.
/// Used by scripted scenarios and tests.
#[derive(Debug, Default)]
pub struct FixedCodes {
    queue: Mutex<VecDeque<(String, String)>>,
    fallback: RandomCodes,
}

impl FixedCodes {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            queue: Mutex::new(pairs.into_iter().collect()),
            fallback: RandomCodes::default(),
        }
    }

    pub fn push(&self, keeper: impl Into<String>, controller: impl Into<String>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back((keeper.into(), controller.into()));
        }
    }
}

impl CodeGenerator for FixedCodes {
    fn generate_pair(&self) -> (VerificationCode, VerificationCode) {
        let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some((keeper, controller)) if keeper != controller => {
                (VerificationCode(keeper), VerificationCode(controller))
            }
            Some(_) => {
                tracing::warn!("Ignoring fixed code pair with identical codes");
                self.fallback.generate_pair()
            }
            None => self.fallback.generate_pair(),
        }
    }
}

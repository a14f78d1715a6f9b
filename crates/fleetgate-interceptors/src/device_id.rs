use std::collections::BTreeSet;
use thiserror::Error;

/// Upper bound on a device id, in characters.
pub const MAX_DEVICE_ID_LEN: usize = 256;

/// Symbols a device id may never contain, on top of control and whitespace
/// characters.
pub const FORBIDDEN_SYMBOLS: &[char] = &[
    '±', '!', '@', '£', '$', '%', '&', '*', '+', '§', '¡', '€', '#', '¢', '¶', '•', 'ª', 'º', '«',
    '\\', '/', '<', '>', '?', ':', ';', '|', '=', ',', '"',
];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeviceIdViolation {
    #[error("device id is empty")]
    Empty,
    #[error("device id is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("device id contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

impl DeviceIdViolation {
    pub fn rule(&self) -> &'static str {
        match self {
            DeviceIdViolation::Empty => "empty",
            DeviceIdViolation::TooLong { .. } => "too_long",
            DeviceIdViolation::ForbiddenChar(_) => "forbidden_char",
        }
    }
}

/// Syntactic policy for claimed device ids.
///
/// Built once at startup. The default policy is the fleet-wide one; operators
/// may tighten it (shorter limit, more forbidden characters) but never relax
/// the built-in set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIdPolicy {
    max_len: usize,
    extra_forbidden: BTreeSet<char>,
}

impl Default for DeviceIdPolicy {
    fn default() -> Self {
        Self {
            max_len: MAX_DEVICE_ID_LEN,
            extra_forbidden: BTreeSet::new(),
        }
    }
}

impl DeviceIdPolicy {
    /// `max_len` is clamped to `1..=MAX_DEVICE_ID_LEN`.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.clamp(1, MAX_DEVICE_ID_LEN),
            extra_forbidden: BTreeSet::new(),
        }
    }

    pub fn forbid(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.extra_forbidden.extend(chars);
        self
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_forbidden(&self, ch: char) -> bool {
        ch.is_control()
            || ch.is_whitespace()
            || FORBIDDEN_SYMBOLS.contains(&ch)
            || self.extra_forbidden.contains(&ch)
    }

    /// Rules apply in order: emptiness, length, then characters.
    pub fn check(&self, id: &str) -> Result<(), DeviceIdViolation> {
        if id.is_empty() {
            return Err(DeviceIdViolation::Empty);
        }
        let len = id.chars().count();
        if len > self.max_len {
            return Err(DeviceIdViolation::TooLong {
                len,
                max: self.max_len,
            });
        }
        match id.chars().find(|ch| self.is_forbidden(*ch)) {
            Some(ch) => Err(DeviceIdViolation::ForbiddenChar(ch)),
            None => Ok(()),
        }
    }

    pub fn validate(&self, id: &str) -> bool {
        self.check(id).is_ok()
    }
}

/// Checks `id` against the default policy.
pub fn validate(id: &str) -> bool {
    DeviceIdPolicy::default().validate(id)
}

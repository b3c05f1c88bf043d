//! Session identifier generation

use std::fmt;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

/// Length of identifiers produced by the default strategy
pub const DEFAULT_ID_LENGTH: usize = 24;

/// How the random part of an identifier is produced
#[derive(Clone)]
pub enum IdStrategy {
    /// `len` alphanumeric characters from the thread-local RNG
    Random(usize),
    /// UUID v4, hyphenated
    Uuid,
    /// UUID v7, simple form; sorts by creation time
    TimeOrdered,
    /// Caller-supplied function
    Custom(Arc<dyn Fn() -> String + Send + Sync>),
}

impl fmt::Debug for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdStrategy::Random(len) => f.debug_tuple("Random").field(len).finish(),
            IdStrategy::Uuid => f.write_str("Uuid"),
            IdStrategy::TimeOrdered => f.write_str("TimeOrdered"),
            IdStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Produces identifiers used both as cookie value and store key
#[derive(Clone, Debug)]
pub struct IdGenerator {
    strategy: IdStrategy,
    prefix: Option<String>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(IdStrategy::Random(DEFAULT_ID_LENGTH))
    }
}

impl IdGenerator {
    /// Create a generator for the given strategy, without prefix
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            prefix: None,
        }
    }

    /// Generator backed by a custom function
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::new(IdStrategy::Custom(Arc::new(f)))
    }

    /// Prepend `prefix` to every generated identifier
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Generate a new identifier
    pub fn generate(&self) -> String {
        let id = match &self.strategy {
            IdStrategy::Random(len) => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(*len)
                .map(char::from)
                .collect(),
            IdStrategy::Uuid => Uuid::new_v4().to_string(),
            IdStrategy::TimeOrdered => Uuid::now_v7().simple().to_string(),
            IdStrategy::Custom(f) => f(),
        };
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, id),
            None => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_random() {
        let gen = IdGenerator::default();
        let a = gen.generate();
        let b = gen.generate();
        assert_eq!(a.len(), DEFAULT_ID_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_time_ordered() {
        let gen = IdGenerator::new(IdStrategy::TimeOrdered);
        let a = gen.generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = gen.generate();
        assert_eq!(a.len(), 32);
        assert!(a < b);
    }

    #[test]
    fn test_prefix_and_custom() {
        let gen = IdGenerator::custom(|| "fixed".to_string()).with_prefix("sess:");
        assert_eq!(gen.generate(), "sess:fixed");

        let uuid = IdGenerator::new(IdStrategy::Uuid).with_prefix("u-");
        assert!(uuid.generate().starts_with("u-"));
    }
}

use serde::Deserialize;

use crate::error::AdapterError;

/// How datetime arguments are stored in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TimestampFormat {
    /// `YYYY-MM-DDTHH:MM:SS.mmm+00:00` text.
    #[default]
    #[serde(rename = "iso8601")]
    Iso8601,
    /// Milliseconds since the Unix epoch, stored as an integer.
    #[serde(rename = "unixepoch-ms", alias = "epoch-ms")]
    EpochMs,
}

/// Value-codec options, fixed once the adapter is built.
///
/// The two `allow_*` flags only make sense for epoch-millisecond timestamps read
/// as wide integers, and they contradict each other, so
/// [`AdapterOptions::validate`] rejects any other combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    pub timestamp_format: TimestampFormat,
    /// Treat every engine integer as wide (decoded to a decimal string).
    pub use_wide_integers: bool,
    /// Decode wide integers in the plausible-timestamp range as plain numbers.
    pub allow_wide_integer_numeric_coercion: bool,
    /// Decode wide integers in undeclared (aggregate/expression) columns as plain numbers.
    pub allow_unsafe_aggregate_on_wide_timestamp: bool,
}

impl AdapterOptions {
    #[must_use]
    pub fn builder() -> AdapterOptionsBuilder {
        AdapterOptionsBuilder::default()
    }

    /// Parse options from the factory's JSON form and validate them.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` on malformed JSON or an invalid flag combination.
    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        let opts: AdapterOptions = serde_json::from_str(json)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check the `allow_*` flag invariants.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` describing the first violated rule.
    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.allow_wide_integer_numeric_coercion
            && self.allow_unsafe_aggregate_on_wide_timestamp
        {
            return Err(AdapterError::ConfigError(
                "allow_wide_integer_numeric_coercion and allow_unsafe_aggregate_on_wide_timestamp are mutually exclusive".into(),
            ));
        }
        let any_allow =
            self.allow_wide_integer_numeric_coercion || self.allow_unsafe_aggregate_on_wide_timestamp;
        if any_allow
            && !(self.timestamp_format == TimestampFormat::EpochMs && self.use_wide_integers)
        {
            return Err(AdapterError::ConfigError(
                "wide-integer timestamp coercion requires timestamp_format = unixepoch-ms and use_wide_integers = true".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`AdapterOptions`].
#[derive(Debug, Clone, Default)]
pub struct AdapterOptionsBuilder {
    opts: AdapterOptions,
}

impl AdapterOptionsBuilder {
    #[must_use]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.opts.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn use_wide_integers(mut self, enabled: bool) -> Self {
        self.opts.use_wide_integers = enabled;
        self
    }

    #[must_use]
    pub fn allow_wide_integer_numeric_coercion(mut self, enabled: bool) -> Self {
        self.opts.allow_wide_integer_numeric_coercion = enabled;
        self
    }

    #[must_use]
    pub fn allow_unsafe_aggregate_on_wide_timestamp(mut self, enabled: bool) -> Self {
        self.opts.allow_unsafe_aggregate_on_wide_timestamp = enabled;
        self
    }

    /// Validate and return the options.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` if the flag combination is invalid.
    pub fn build(self) -> Result<AdapterOptions, AdapterError> {
        self.opts.validate()?;
        Ok(self.opts)
    }
}

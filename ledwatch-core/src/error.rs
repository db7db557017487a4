//! Error types for ledwatch operations

/// Result type for ledwatch operations
pub type Result<T> = std::result::Result<T, LedwatchError>;

/// Error types for the ledwatch agent
#[derive(Debug, thiserror::Error)]
pub enum LedwatchError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Two monitors were configured with the same indicator slot
    #[error("Duplicate indicator slot {slot}: used by '{first}' and '{second}'")]
    DuplicateSlot {
        slot: usize,
        first: String,
        second: String,
    },

    /// A monitor slot does not exist on the configured strip
    #[error("Indicator slot {slot} for '{monitor}' is out of range (strip has {len} slots)")]
    SlotOutOfRange {
        monitor: String,
        slot: usize,
        len: usize,
    },

    /// The indicator sink could not be acquired
    #[error("Indicator sink unavailable: {0}")]
    SinkUnavailable(String),
}

/// Failure of a single probe invocation.
///
/// Probe errors are an expected, recurring outcome. The monitor turns them into
/// a color and a status line; they never stop the loop.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The sensor could not be read
    #[error("Sensor read failed ({source_path}): {reason}")]
    SensorRead { source_path: String, reason: String },

    /// The sensor returned something that is not a reading
    #[error("Invalid sensor value '{value}'")]
    InvalidReading { value: String },

    /// Any other probe failure
    #[error("Probe failed: {0}")]
    Failed(String),
}

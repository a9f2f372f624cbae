use thiserror::Error;

/// Malformed region tables or thresholds, detected at construction.
///
/// Always fatal: the estimator refuses to exist, so no frame is ever
/// processed with a bad configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionConfigError {
    #[error("region `{name}` has no landmark indices")]
    EmptyRegion { name: &'static str },
    #[error("regions `{upper}` ({upper_len} points) and `{lower}` ({lower_len} points) must pair up one-to-one")]
    LengthMismatch {
        upper: &'static str,
        upper_len: usize,
        lower: &'static str,
        lower_len: usize,
    },
    #[error("region `{region}` references landmark {index}, outside the {scheme_len}-point `{scheme}` scheme")]
    IndexOutOfScheme {
        region: &'static str,
        index: usize,
        scheme: &'static str,
        scheme_len: usize,
    },
    #[error("threshold `{name}` must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

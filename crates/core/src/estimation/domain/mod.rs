pub mod anatomical_region;
pub mod aperture;
pub mod config_error;
pub mod facial_state_estimator;
pub mod region_tables;
pub mod state_classifier;

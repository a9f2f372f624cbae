//! Eyelid and lip index tables for the MediaPipe face-mesh numbering.
//!
//! These are versioned together with [`FACE_MESH`]; if the provider's
//! numbering changes they must be revalidated. Upper and lower edges pair up
//! positionally and may share indices.

use crate::detection::domain::face_landmarks::{LandmarkScheme, FACE_MESH};

use super::anatomical_region::AnatomicalRegion;

/// Scheme every table in this module refers to.
pub const SCHEME: LandmarkScheme = FACE_MESH;

pub const UPPER_LIP: AnatomicalRegion =
    AnatomicalRegion::new("upper-lip", &[61, 40, 37, 0, 267, 269, 270, 409]);
pub const LOWER_LIP: AnatomicalRegion =
    AnatomicalRegion::new("lower-lip", &[291, 375, 321, 405, 314, 17, 84, 181]);

pub const LEFT_EYE_UPPER: AnatomicalRegion =
    AnatomicalRegion::new("left-eye-upper", &[386, 374, 373, 390, 388, 466]);
pub const LEFT_EYE_LOWER: AnatomicalRegion =
    AnatomicalRegion::new("left-eye-lower", &[263, 249, 390, 373, 374, 380]);

pub const RIGHT_EYE_UPPER: AnatomicalRegion =
    AnatomicalRegion::new("right-eye-upper", &[159, 145, 144, 163, 161, 246]);
pub const RIGHT_EYE_LOWER: AnatomicalRegion =
    AnatomicalRegion::new("right-eye-lower", &[33, 133, 163, 144, 145, 153]);

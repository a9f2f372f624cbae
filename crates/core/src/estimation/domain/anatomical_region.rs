use crate::detection::domain::face_landmarks::LandmarkScheme;

use super::config_error::RegionConfigError;

/// A named, ordered list of landmark indices denoting one facial edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnatomicalRegion {
    pub name: &'static str,
    pub indices: &'static [usize],
}

impl AnatomicalRegion {
    pub const fn new(name: &'static str, indices: &'static [usize]) -> Self {
        Self { name, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn validate_for(&self, scheme: &LandmarkScheme) -> Result<(), RegionConfigError> {
        match self.indices.iter().find(|&&i| !scheme.contains(i)) {
            Some(&index) => Err(RegionConfigError::IndexOutOfScheme {
                region: self.name,
                index,
                scheme: scheme.name(),
                scheme_len: scheme.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Opposing edges of one facial aperture (an eyelid pair or a lip pair).
///
/// Construction guarantees both edges are non-empty and of equal length, so
/// `upper.indices[i]` and `lower.indices[i]` always form a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionPair {
    upper: AnatomicalRegion,
    lower: AnatomicalRegion,
}

impl RegionPair {
    pub fn new(
        upper: AnatomicalRegion,
        lower: AnatomicalRegion,
    ) -> Result<Self, RegionConfigError> {
        if upper.is_empty() {
            return Err(RegionConfigError::EmptyRegion { name: upper.name });
        }
        if lower.is_empty() {
            return Err(RegionConfigError::EmptyRegion { name: lower.name });
        }
        if upper.len() != lower.len() {
            return Err(RegionConfigError::LengthMismatch {
                upper: upper.name,
                upper_len: upper.len(),
                lower: lower.name,
                lower_len: lower.len(),
            });
        }
        Ok(Self { upper, lower })
    }

    /// Checks every index against the provider's numbering scheme.
    pub fn validate_for(&self, scheme: &LandmarkScheme) -> Result<(), RegionConfigError> {
        self.upper.validate_for(scheme)?;
        self.lower.validate_for(scheme)
    }

    pub fn upper(&self) -> &AnatomicalRegion {
        &self.upper
    }

    pub fn lower(&self) -> &AnatomicalRegion {
        &self.lower
    }

    /// Positional `(upper, lower)` index pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.upper
            .indices
            .iter()
            .copied()
            .zip(self.lower.indices.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.upper.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Highest landmark index either edge refers to.
    pub fn max_index(&self) -> usize {
        self.upper
            .indices
            .iter()
            .chain(self.lower.indices)
            .copied()
            .max()
            .unwrap_or(0)
    }
}

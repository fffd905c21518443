use crate::error::{MotifError, Result};
use serde::{Deserialize, Serialize};

/// Which strands a scan scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strands {
    /// Only the motif as given
    #[default]
    Forward,
    /// The motif and its reverse complement at every offset
    Both,
}

/// Settings shared by every (sequence, motif) pair of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum relative affinity for a window to be reported
    pub threshold: f64,
    /// Score windows on the linear (`exp`) scale rather than log-odds
    pub linear: bool,
    pub strands: Strands,
    /// Stop after this many matches
    pub limit: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            linear: true,
            strands: Strands::Forward,
            limit: None,
        }
    }
}

impl ScanConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    pub fn with_strands(mut self, strands: Strands) -> Self {
        self.strands = strands;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// # Errors
    /// * `MotifError::InvalidParameter` for a NaN threshold or a zero limit
    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() {
            return Err(MotifError::invalid_parameter(
                "threshold",
                self.threshold,
                "must be a number",
            ));
        }
        if self.limit == Some(0) {
            return Err(MotifError::invalid_parameter(
                "limit",
                0,
                "must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

use std::net::SocketAddr;

use crate::error::{InsightError, InsightResult};

/// Cut-offs used by the reasons report and the high-performer baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub min_interactions: u64,
    pub min_average_discount: f64,
    pub min_total_contacts: u64,
    pub high_performer_fraction: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_interactions: 10,
            min_average_discount: 20.0,
            min_total_contacts: 10,
            high_performer_fraction: 0.25,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> InsightResult<()> {
        if !(self.high_performer_fraction > 0.0 && self.high_performer_fraction <= 1.0) {
            return Err(InsightError::InvalidThresholds(format!(
                "high_performer_fraction must be in (0, 1], got {}",
                self.high_performer_fraction
            )));
        }
        if !self.min_average_discount.is_finite() || self.min_average_discount < 0.0 {
            return Err(InsightError::InvalidThresholds(format!(
                "min_average_discount must be a non-negative percentage, got {}",
                self.min_average_discount
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub thresholds: Thresholds,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_upload_bytes: 10 * 1024 * 1024,
            thresholds: Thresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        for fraction in [0.0, -0.5, 1.5, f64::NAN] {
            let thresholds = Thresholds {
                high_performer_fraction: fraction,
                ..Thresholds::default()
            };
            assert!(thresholds.validate().is_err(), "fraction {fraction}");
        }
    }

    #[test]
    fn rejects_negative_discount_threshold() {
        let thresholds = Thresholds {
            min_average_discount: -1.0,
            ..Thresholds::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(InsightError::InvalidThresholds(_))
        ));
    }
}

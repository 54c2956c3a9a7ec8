//! Importance weights for the fields tracked by the confidence aggregator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Fields that contribute to confidence and completeness scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    CompanyName,
    WebsiteUrl,
    Industry,
    EmployeeCount,
    RevenueEstimate,
    Headquarters,
}

impl TrackedField {
    pub const ALL: [TrackedField; 6] = [
        TrackedField::CompanyName,
        TrackedField::WebsiteUrl,
        TrackedField::Industry,
        TrackedField::EmployeeCount,
        TrackedField::RevenueEstimate,
        TrackedField::Headquarters,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrackedField::CompanyName => "company_name",
            TrackedField::WebsiteUrl => "website_url",
            TrackedField::Industry => "industry",
            TrackedField::EmployeeCount => "employee_count",
            TrackedField::RevenueEstimate => "revenue_estimate",
            TrackedField::Headquarters => "headquarters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldWeights {
    pub company_name: f64,
    pub website_url: f64,
    pub industry: f64,
    pub employee_count: f64,
    pub revenue_estimate: f64,
    pub headquarters: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            company_name: 1.0,
            website_url: 0.8,
            industry: 0.7,
            employee_count: 0.6,
            revenue_estimate: 0.8,
            headquarters: 0.5,
        }
    }
}

impl FieldWeights {
    /// Largest accepted weight; keeps `10 × weight` within the 0-100 score range.
    pub const MAX_WEIGHT: f64 = 10.0;

    #[must_use]
    pub fn weight(&self, field: TrackedField) -> f64 {
        match field {
            TrackedField::CompanyName => self.company_name,
            TrackedField::WebsiteUrl => self.website_url,
            TrackedField::Industry => self.industry,
            TrackedField::EmployeeCount => self.employee_count,
            TrackedField::RevenueEstimate => self.revenue_estimate,
            TrackedField::Headquarters => self.headquarters,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for field in TrackedField::ALL {
            let w = self.weight(field);
            if !w.is_finite() || !(0.0..=Self::MAX_WEIGHT).contains(&w) {
                return Err(ConfigError::Validation(format!(
                    "weight for '{}' must be between 0 and {}, got {w}",
                    field.as_str(),
                    Self::MAX_WEIGHT
                )));
            }
        }
        Ok(())
    }
}

/// Load field weights from a YAML file. Fields missing from the file keep
/// their default weight.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or holds a weight
/// outside `0..=10`.
pub fn load_field_weights(path: &Path) -> Result<FieldWeights, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WeightsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let weights: FieldWeights =
        serde_yaml::from_str(&content).map_err(ConfigError::WeightsFileParse)?;

    weights.validate()?;

    Ok(weights)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write yaml");
        file
    }

    #[test]
    fn defaults_match_reference_weighting() {
        let w = FieldWeights::default();
        assert!((w.weight(TrackedField::CompanyName) - 1.0).abs() < f64::EPSILON);
        assert!((w.weight(TrackedField::WebsiteUrl) - 0.8).abs() < f64::EPSILON);
        assert!((w.weight(TrackedField::Industry) - 0.7).abs() < f64::EPSILON);
        assert!((w.weight(TrackedField::EmployeeCount) - 0.6).abs() < f64::EPSILON);
        assert!((w.weight(TrackedField::RevenueEstimate) - 0.8).abs() < f64::EPSILON);
        assert!((w.weight(TrackedField::Headquarters) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let file = write_yaml("industry: 0.9\nheadquarters: 0.1\n");
        let w = load_field_weights(file.path()).expect("load weights");
        assert!((w.industry - 0.9).abs() < f64::EPSILON);
        assert!((w.headquarters - 0.1).abs() < f64::EPSILON);
        assert!((w.company_name - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let file = write_yaml("ceo_name: 0.4\n");
        let err = load_field_weights(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::WeightsFileParse(_)), "got {err:?}");
    }

    #[test]
    fn out_of_range_weight_fails_validation() {
        let file = write_yaml("website_url: -0.5\n");
        let err = load_field_weights(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("website_url")));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_field_weights(Path::new("/nonexistent/weights.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::WeightsFileIo { .. }));
    }
}

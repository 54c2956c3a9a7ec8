//! Field-level validation of a master profile.
//!
//! The website check goes through a [`ReachabilityProbe`]; the default
//! [`HttpProbe`] issues a bounded-timeout `HEAD` request. Every check yields
//! exactly one [`NewValidationRecord`] and no check fails outward: an
//! unreachable site is recorded as invalid data, not returned as an error.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use thiserror::Error;

use uppi_core::{
    parse_website_url, AppConfig, MasterCompanyProfile, NewValidationRecord, ValidationMethod, ValidationStatus,
};

pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_USER_AGENT: &str = "uppi/0.1 (company-validation)";

pub const WEBSITE_REACHABLE_CONFIDENCE: f64 = 0.9;
pub const WEBSITE_UNREACHABLE_CONFIDENCE: f64 = 0.1;
const NAME_VALID_CONFIDENCE: f64 = 0.8;
const NAME_INVALID_CONFIDENCE: f64 = 0.3;
const EMPLOYEES_VALID_CONFIDENCE: f64 = 0.7;
const EMPLOYEES_INVALID_CONFIDENCE: f64 = 0.2;

const UNPARSEABLE_WEBSITE_REASON: &str = "website URL could not be parsed as an http(s) address";

/// Why a website did not answer with a 2xx.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HEAD {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("HEAD {url} timed out")]
    Timeout { url: String },

    #[error("HEAD {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Checks whether a URL is reachable.
pub trait ReachabilityProbe: Send + Sync {
    fn probe<'a>(&'a self, url: &'a Url)
        -> impl Future<Output = Result<(), ProbeError>> + Send + 'a;
}

/// `HEAD` probe over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the client cannot be constructed.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            Duration::from_secs(config.validator_timeout_secs),
            &config.validator_user_agent,
        )
    }

    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the client cannot be constructed.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(
            Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            DEFAULT_USER_AGENT,
        )
    }
}

impl ReachabilityProbe for HttpProbe {
    async fn probe<'a>(&'a self, url: &'a Url) -> Result<(), ProbeError> {
        let response = self.client.head(url.clone()).send().await.map_err(|source| {
            if source.is_timeout() {
                ProbeError::Timeout {
                    url: url.to_string(),
                }
            } else {
                ProbeError::Request {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

/// Runs the fixed validation checklist against a profile.
#[derive(Debug, Clone)]
pub struct Validator<P> {
    probe: P,
}

impl<P: ReachabilityProbe> Validator<P> {
    #[must_use]
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// One record per applicable check: website (when set), company name
    /// (always) and employee count (when set).
    pub async fn validate(&self, profile: &MasterCompanyProfile) -> Vec<NewValidationRecord> {
        let mut records = Vec::with_capacity(3);

        if let Some(url) = profile.website_url.as_deref() {
            records.push(self.check_website(profile, url).await);
        }
        records.push(check_company_name(profile));
        if let Some(count) = profile.employee_count {
            records.push(check_employee_count(profile, count));
        }

        records
    }

    /// Bare hosts are probed over `https://`; a value that does not parse is
    /// recorded as invalid without a request.
    async fn check_website(&self, profile: &MasterCompanyProfile, raw: &str) -> NewValidationRecord {
        let (validated_value, discrepancy_reason) = match parse_website_url(raw) {
            None => {
                tracing::info!(profile_id = %profile.id, website_url = raw, "website URL unparseable");
                (None, Some(UNPARSEABLE_WEBSITE_REASON.to_string()))
            }
            Some(url) => match self.probe.probe(&url).await {
                Ok(()) => (Some(url.to_string()), None),
                Err(err) => {
                    tracing::info!(profile_id = %profile.id, error = %err, "website check failed");
                    (None, Some(err.to_string()))
                }
            },
        };
        let is_valid = validated_value.is_some();
        let confidence_score = if is_valid {
            WEBSITE_REACHABLE_CONFIDENCE
        } else {
            WEBSITE_UNREACHABLE_CONFIDENCE
        };

        NewValidationRecord {
            master_profile_id: profile.id,
            field_name: "website_url".to_string(),
            original_value: Some(raw.to_string()),
            validated_value,
            validation_method: ValidationMethod::HttpHeadRequest,
            is_valid,
            confidence_score,
            discrepancy_reason,
        }
    }
}

fn check_company_name(profile: &MasterCompanyProfile) -> NewValidationRecord {
    let name = profile.company_name.trim();
    let is_valid = name.chars().count() > 2;
    basic_record(
        profile,
        "company_name",
        name.to_string(),
        is_valid,
        if is_valid {
            NAME_VALID_CONFIDENCE
        } else {
            NAME_INVALID_CONFIDENCE
        },
        "company name is too short",
    )
}

fn check_employee_count(profile: &MasterCompanyProfile, count: i64) -> NewValidationRecord {
    let is_valid = count > 0;
    basic_record(
        profile,
        "employee_count",
        count.to_string(),
        is_valid,
        if is_valid {
            EMPLOYEES_VALID_CONFIDENCE
        } else {
            EMPLOYEES_INVALID_CONFIDENCE
        },
        "employee count must be positive",
    )
}

fn basic_record(
    profile: &MasterCompanyProfile,
    field_name: &str,
    value: String,
    is_valid: bool,
    confidence_score: f64,
    failure_reason: &str,
) -> NewValidationRecord {
    NewValidationRecord {
        master_profile_id: profile.id,
        field_name: field_name.to_string(),
        validated_value: is_valid.then(|| value.clone()),
        original_value: Some(value),
        validation_method: ValidationMethod::BasicValidation,
        is_valid,
        confidence_score,
        discrepancy_reason: (!is_valid).then(|| failure_reason.to_string()),
    }
}

/// `Validated` when every record passed, `Disputed` otherwise.
#[must_use]
pub fn validation_status(records: &[NewValidationRecord]) -> ValidationStatus {
    if records.iter().all(|r| r.is_valid) {
        ValidationStatus::Validated
    } else {
        ValidationStatus::Disputed
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;

//! Exact-match lookup of the master profile for a company.

use uppi_core::{normalize_company_name, ConsolidationStore, MasterCompanyProfile, SourceAnalysis};

/// The display name a consolidation runs under and its dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyName {
    pub display: String,
    pub normalized: String,
}

impl CompanyName {
    #[must_use]
    pub fn new(display: &str) -> Self {
        let display = display.trim().to_string();
        let normalized = normalize_company_name(&display);
        Self {
            display,
            normalized,
        }
    }

    /// The requested name when it is non-blank, otherwise the analysis's own.
    #[must_use]
    pub fn resolve(requested: Option<&str>, analysis: &SourceAnalysis) -> Self {
        match requested.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => Self::new(name),
            None => Self::new(&analysis.company_name),
        }
    }
}

/// Find the master profile whose normalized name equals `normalized_name`.
///
/// An empty key never matches and is not looked up. Should storage hold more
/// than one match, the oldest wins and a warning is logged.
///
/// # Errors
///
/// Returns the store's error if the lookup fails.
pub async fn find_master_profile<S: ConsolidationStore>(
    store: &S,
    normalized_name: &str,
) -> Result<Option<MasterCompanyProfile>, S::Error> {
    if normalized_name.is_empty() {
        return Ok(None);
    }

    let matches = store.find_profiles_by_normalized_name(normalized_name).await?;
    if matches.len() > 1 {
        tracing::warn!(
            normalized_name,
            count = matches.len(),
            kept = %matches[0].id,
            "multiple master profiles share a normalized name; using the oldest"
        );
    }
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn analysis(company_name: &str) -> SourceAnalysis {
        SourceAnalysis {
            id: Uuid::new_v4(),
            company_name: company_name.to_string(),
            website_url: None,
            industry: None,
            employee_count: None,
            revenue_estimate: None,
            headquarters: None,
            founded_year: None,
            description: None,
            analysis_payload: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn requested_name_takes_precedence() {
        let name = CompanyName::resolve(Some("  Acme Corp. "), &analysis("Globex LLC"));
        assert_eq!(name.display, "Acme Corp.");
        assert_eq!(name.normalized, "acme");
    }

    #[test]
    fn blank_requested_name_falls_back_to_analysis() {
        for requested in [None, Some(""), Some("   ")] {
            let name = CompanyName::resolve(requested, &analysis("Globex LLC"));
            assert_eq!(name.display, "Globex LLC");
            assert_eq!(name.normalized, "globex");
        }
    }
}

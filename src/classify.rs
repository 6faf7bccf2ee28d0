//! Request classification.
//!
//! Every intercepted path lands in exactly one [`RequestCategory`]. Healthcare
//! data is checked first, so `/patients.js` is data, not shell.

use serde::Serialize;

use crate::manifest::Manifest;

/// Path keywords that mark healthcare data requests.
pub const HEALTHCARE_DATA_PATTERNS: &[&str] = &[
    "patients",
    "appointments",
    "visits",
    "services",
    "reports",
    "registers",
    "users",
    "backup",
    "localStorage",
];

const SHELL_SUFFIXES: &[&str] = &[".html", ".css", ".js", ".json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestCategory {
    /// Stale-while-revalidate against the data partition
    HealthcareData,
    /// Cache-first against the shell partition
    AppShell,
    /// Network-first with shell partition fallback
    Generic,
}

/// Static path classifier built at deploy time.
#[derive(Debug, Clone)]
pub struct Classifier {
    manifest: Manifest,
    /// Lower-cased keywords
    patterns: Vec<String>,
}

impl Classifier {
    pub fn new(manifest: Manifest, patterns: &[&str]) -> Self {
        Self {
            manifest,
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Classifier with the standard healthcare keyword list.
    pub fn with_default_patterns(manifest: Manifest) -> Self {
        Self::new(manifest, HEALTHCARE_DATA_PATTERNS)
    }

    pub fn classify(&self, path: &str) -> RequestCategory {
        if self.is_healthcare_data(path) {
            RequestCategory::HealthcareData
        } else if self.is_app_shell(path) {
            RequestCategory::AppShell
        } else {
            RequestCategory::Generic
        }
    }

    fn is_healthcare_data(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.patterns.iter().any(|pattern| path.contains(pattern))
    }

    fn is_app_shell(&self, path: &str) -> bool {
        path == "/"
            || self.manifest.contains(path)
            || SHELL_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;

    fn classifier() -> Classifier {
        Classifier::with_default_patterns(Manifest::for_role(Role::Admin))
    }

    #[test]
    fn test_healthcare_data_paths() {
        let c = classifier();
        assert_eq!(c.classify("/patients/list"), RequestCategory::HealthcareData);
        assert_eq!(c.classify("/api/appointments?day=1"), RequestCategory::HealthcareData);
        assert_eq!(c.classify("/Reports/monthly"), RequestCategory::HealthcareData);
        assert_eq!(c.classify("/sync/localstorage"), RequestCategory::HealthcareData);
        assert_eq!(c.classify("/LOCALSTORAGE"), RequestCategory::HealthcareData);
    }

    #[test]
    fn test_data_wins_over_shell() {
        let c = classifier();
        // In the manifest and ends with .js, but carries a data keyword
        assert_eq!(c.classify("/patients.js"), RequestCategory::HealthcareData);
        assert_eq!(c.classify("/users.json"), RequestCategory::HealthcareData);
    }

    #[test]
    fn test_app_shell_paths() {
        let c = classifier();
        assert_eq!(c.classify("/"), RequestCategory::AppShell);
        assert_eq!(c.classify("/index.html"), RequestCategory::AppShell);
        assert_eq!(c.classify("/logo.png"), RequestCategory::AppShell);
        assert_eq!(c.classify("/favicon.ico"), RequestCategory::AppShell);
        assert_eq!(c.classify("/vendor/chart.js"), RequestCategory::AppShell);
        assert_eq!(c.classify("/theme/dark.css"), RequestCategory::AppShell);
        assert_eq!(c.classify("/manifest.json"), RequestCategory::AppShell);
    }

    #[test]
    fn test_generic_paths() {
        let c = classifier();
        assert_eq!(c.classify("/images/banner.png"), RequestCategory::Generic);
        assert_eq!(c.classify("/fonts/inter.woff2"), RequestCategory::Generic);
        assert_eq!(c.classify(""), RequestCategory::Generic);
    }

    #[test]
    fn test_custom_patterns() {
        let c = Classifier::new(Manifest::new(["/"]), &["Ledger"]);
        assert_eq!(c.classify("/ledger/2024"), RequestCategory::HealthcareData);
        assert_eq!(c.classify("/patients"), RequestCategory::Generic);
    }
}

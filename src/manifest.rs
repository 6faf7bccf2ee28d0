//! App-shell manifest.
//!
//! The list of paths pre-cached on install: base assets, the role's own
//! scripts, then the shared clinic modules. Order is kept, duplicates dropped.

use crate::config::Role;

/// Assets every flavour of the app needs to boot offline.
pub const BASE_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/offline.html",
    "/styles.css",
    "/favicon.ico",
    "/favicon.svg",
    "/logo.png",
    "/manifest.json",
    "/icon-192.png",
    "/icon-512.png",
    "/apple-touch-icon.png",
    "/apple-touch-icon-precomposed.png",
    "/favicon-96x96.png",
];

const ADMIN_SCRIPTS: &[&str] = &["/app.js", "/admin.js", "/registers.js"];

const USERS_SCRIPTS: &[&str] = &["/app.js", "/users.js"];

/// Modules shared by both flavours.
pub const CORE_MODULES: &[&str] = &[
    "/auth.js",
    "/db.js",
    "/helpers.js",
    "/layout.js",
    "/patients.js",
    "/appointments.js",
    "/visits.js",
    "/reports.js",
    "/services.js",
    "/backup.js",
    "/export.js",
    "/forms.js",
    "/pwa.js",
];

/// Path of the page served to failed navigations.
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Path of the root document, the last resort for failed navigations.
pub const ROOT_DOCUMENT: &str = "/index.html";

/// Ordered, de-duplicated app-shell paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    paths: Vec<String>,
}

impl Manifest {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into();
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self { paths: unique }
    }

    /// The full manifest for a role.
    pub fn for_role(role: Role) -> Self {
        let scripts = match role {
            Role::Admin => ADMIN_SCRIPTS,
            Role::Users => USERS_SCRIPTS,
        };
        Self::new(
            BASE_ASSETS
                .iter()
                .chain(scripts)
                .chain(CORE_MODULES)
                .copied(),
        )
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

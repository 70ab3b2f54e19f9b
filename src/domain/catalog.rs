use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use super::AppError;

/// Programs shipped with the application, in display order.
const BUILTIN: &[(&str, &str)] = &[
    (
        "WinRAR",
        "https://www.win-rar.com/fileadmin/winrar-versions/winrar/winrar-x64-713.exe",
    ),
    ("CPU-Z", "https://download.cpuid.com/cpu-z/cpu-z_2.16-en.exe"),
    (
        "Automatic Driver Installer",
        "https://www.glenn.delahoy.com/downloads/sdio/SDIO_1.15.5.816.zip",
    ),
    (
        "DirectX All In One",
        "https://download.microsoft.com/download/1/7/1/1718ccc4-6315-4d8e-9543-8e28a4e18c4c/dxwebsetup.exe",
    ),
    (
        "Bundle of usefull apps",
        "https://github.com/CazymirTM/simpledownloaderneeds/raw/refs/heads/main/Ninite%20Chrome%20Java%20AdoptOpenJDK%208%20Installer.exe",
    ),
    (
        "GIMP",
        "https://download.gimp.org/mirror/pub/gimp/v2.10/windows/gimp-2.10.38-setup-1.exe",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Fixed, ordered set of download targets.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate names and non-HTTP(S) URLs.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(AppError::InvalidCatalog(format!(
                    "duplicate entry '{}'",
                    entry.name
                )));
            }

            let url = Url::parse(&entry.url)
                .map_err(|e| AppError::InvalidCatalog(format!("{}: {}", entry.name, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::InvalidCatalog(format!(
                    "{}: unsupported scheme '{}'",
                    entry.name,
                    url.scheme()
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn builtin() -> Result<Self, AppError> {
        let entries = BUILTIN
            .iter()
            .map(|(name, url)| CatalogEntry::new(*name, *url))
            .collect();

        Self::new(entries)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

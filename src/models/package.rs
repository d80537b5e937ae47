use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A priced generation tier from the package catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Filled in from the catalog key; the service does not repeat it.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub price_cents: u64,
    pub headshot_count: u32,
    pub delivery: String,
}

/// Packages keyed by plan id, as served by `GET /api/packages`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageCatalog {
    packages: BTreeMap<String, Package>,
}

#[derive(Deserialize)]
struct CatalogEnvelope {
    #[serde(default)]
    packages: BTreeMap<String, Package>,
}

impl PackageCatalog {
    pub fn from_json(body: serde_json::Value) -> Result<Self, serde_json::Error> {
        let envelope: CatalogEnvelope = serde_json::from_value(body)?;
        let packages = envelope
            .packages
            .into_iter()
            .map(|(id, mut package)| {
                package.id = id.clone();
                (id, package)
            })
            .collect();
        Ok(Self { packages })
    }

    pub fn get(&self, plan_id: &str) -> Option<&Package> {
        self.packages.get(plan_id)
    }

    pub fn contains(&self, plan_id: &str) -> bool {
        self.packages.contains_key(plan_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl FromIterator<Package> for PackageCatalog {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

/// Static preview of an output crop (LinkedIn profile, email signature, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandingPreview {
    pub id: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingPreviewList {
    #[serde(default)]
    pub previews: Vec<BrandingPreview>,
}

/// Data retention policy served by `GET /api/privacy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPolicy {
    pub input_retention_days: u32,
    pub output_retention_days: u32,
    #[serde(default)]
    pub message: String,
}

impl PrivacyPolicy {
    pub fn summary(&self) -> String {
        format!(
            "Input retention: {} days · Generated outputs: {} days",
            self.input_retention_days, self.output_retention_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_fills_ids_from_keys() {
        let catalog = PackageCatalog::from_json(serde_json::json!({
            "packages": {
                "basic": {"name": "Basic", "headshotCount": 40, "priceCents": 2900, "delivery": "2–3 hr"},
                "executive": {"name": "Executive", "headshotCount": 200, "priceCents": 7900, "delivery": "Priority"}
            }
        }))
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let basic = catalog.get("basic").unwrap();
        assert_eq!(basic.id, "basic");
        assert_eq!(basic.price_cents, 2900);
        assert!(!catalog.contains("team"));
    }

    #[test]
    fn test_catalog_missing_packages_is_empty() {
        let catalog = PackageCatalog::from_json(serde_json::json!({})).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_privacy_summary() {
        let policy = PrivacyPolicy {
            input_retention_days: 7,
            output_retention_days: 30,
            message: String::new(),
        };
        assert_eq!(
            policy.summary(),
            "Input retention: 7 days · Generated outputs: 30 days"
        );
    }
}

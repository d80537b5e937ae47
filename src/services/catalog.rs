use std::sync::Arc;

use serde::Serialize;

use crate::models::order::TeamSize;
use crate::models::package::{
    BrandingPreview, BrandingPreviewList, Package, PackageCatalog, PrivacyPolicy,
};
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::pricing;

/// Price estimate shown before an order is placed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Quote {
    pub plan_id: String,
    pub name: String,
    pub team_size: TeamSize,
    pub total_cents: u64,
}

impl Quote {
    pub fn summary(&self) -> String {
        format!(
            "Selected package: {} ({}) • team {}",
            self.name,
            pricing::format_usd(self.total_cents),
            self.team_size
        )
    }
}

/// Public, unauthenticated information: packages, previews, privacy policy.
pub struct CatalogService {
    api: Arc<ApiClient>,
}

impl CatalogService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// The package catalog, fetched once per session.
    pub async fn packages(&self) -> Result<Arc<PackageCatalog>, CatalogError> {
        if let Some(cached) = self.api.session().catalog() {
            return Ok(cached);
        }

        let response = self.api.get("/api/packages").await?;
        let catalog = PackageCatalog::from_json(response.body).map_err(ApiError::Decode)?;
        tracing::info!(packages = catalog.len(), "Package catalog loaded");
        Ok(self.api.session().cache_catalog(catalog))
    }

    pub async fn package(&self, plan_id: &str) -> Result<Package, CatalogError> {
        let catalog = self.packages().await?;
        catalog
            .get(plan_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownPlan(plan_id.to_string()))
    }

    pub async fn quote(&self, plan_id: &str, team_size: TeamSize) -> Result<Quote, CatalogError> {
        let package = self.package(plan_id).await?;
        Ok(Quote {
            plan_id: package.id,
            name: package.name,
            team_size,
            total_cents: pricing::estimate(package.price_cents, team_size.get()),
        })
    }

    pub async fn branding_previews(&self) -> Result<Vec<BrandingPreview>, CatalogError> {
        let list: BrandingPreviewList = self.api.get("/api/branding-previews").await?.json()?;
        Ok(list.previews)
    }

    pub async fn privacy(&self) -> Result<PrivacyPolicy, CatalogError> {
        Ok(self.api.get("/api/privacy").await?.json()?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unknown package: {0}")]
    UnknownPlan(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_summary() {
        let quote = Quote {
            plan_id: "basic".to_string(),
            name: "Basic".to_string(),
            team_size: TeamSize::clamped(3),
            total_cents: pricing::estimate(2900, 3),
        };
        assert_eq!(quote.summary(), "Selected package: Basic ($78) • team 3");
    }
}

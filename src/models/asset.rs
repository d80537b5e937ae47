use serde::{Deserialize, Serialize};

/// A downloadable output of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub variant: String,
    #[serde(alias = "downloadUrl", alias = "download_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetList {
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_accepts_locator_aliases() {
        let list: AssetList = serde_json::from_value(serde_json::json!({
            "assets": [
                {"variant": "linkedin", "url": "https://cdn.example/1.png"},
                {"variant": "email", "downloadUrl": "https://cdn.example/2.png"}
            ]
        }))
        .unwrap();
        assert_eq!(list.assets.len(), 2);
        assert_eq!(list.assets[1].url, "https://cdn.example/2.png");
    }
}

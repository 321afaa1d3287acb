//! `GET /images?ingredient=<name>` as an [`ImageSearch`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use culina_core::error::Result;
use culina_core::types::PLACEHOLDER_IMAGE_URL;
use culina_inventory::services::ImageSearch;

use crate::client::{check_status, transport, ApiClient};

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

impl ApiClient {
    async fn fetch_image(&self, name: &str) -> Result<Option<String>> {
        let response = self
            .http()
            .get(self.url("images"))
            .query(&[("ingredient", name)])
            .send()
            .await
            .map_err(transport)?;
        let body: ImageResponse = check_status(response)?.json().await.map_err(transport)?;
        Ok(body.image_url)
    }
}

#[async_trait]
impl ImageSearch for ApiClient {
    /// Never fails: any problem yields the placeholder URL.
    async fn image_for(&self, query: &str) -> String {
        match self.fetch_image(query).await {
            Ok(Some(url)) if !url.trim().is_empty() => url,
            Ok(_) => {
                debug!(ingredient = %query, "No image found");
                PLACEHOLDER_IMAGE_URL.to_string()
            }
            Err(e) => {
                warn!(ingredient = %query, error = %e, "Image lookup failed");
                PLACEHOLDER_IMAGE_URL.to_string()
            }
        }
    }
}

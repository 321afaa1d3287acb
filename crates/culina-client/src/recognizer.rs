//! `POST /ingredients-from-image` as an [`IngredientRecognizer`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use culina_core::error::CulinaError;
use culina_core::types::CapturedPhoto;
use culina_inventory::services::IngredientRecognizer;

use crate::client::{check_status, transport, ApiClient};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    base64_image: String,
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    ingredients: Vec<String>,
}

#[async_trait]
impl IngredientRecognizer for ApiClient {
    async fn recognize(&self, photo: &CapturedPhoto) -> Result<Vec<String>, CulinaError> {
        let request = RecognizeRequest {
            base64_image: photo.data_url(),
            mime_type: &photo.mime_type,
        };
        let response = self
            .http()
            .post(self.url("ingredients-from-image"))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        let body: RecognizeResponse = check_status(response)?.json().await.map_err(transport)?;
        info!(count = body.ingredients.len(), "Ingredients recognized");
        Ok(body.ingredients)
    }
}

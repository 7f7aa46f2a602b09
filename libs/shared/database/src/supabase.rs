use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::error::SupabaseError;

/// PostgREST client shared by every service in the process.
///
/// The inner `reqwest::Client` pools connections, so one instance is built at
/// startup and handed out behind an `Arc` instead of being constructed per call.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.database_request_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build configured HTTP client ({}), falling back to defaults", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| SupabaseError::InvalidHeader(format!("apikey: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| SupabaseError::InvalidHeader(format!("authorization: {}", e)))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T, B>(&self, method: Method, path: &str,
                               auth_token: Option<&str>, body: Option<B>)
                               -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(auth_token)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(SupabaseError::from_response(status.as_u16(), &text));
        }

        let data = serde_json::from_str::<T>(&text)?;
        Ok(data)
    }

    /// Calls a Postgres function exposed by PostgREST under `/rest/v1/rpc/`.
    ///
    /// The function body runs inside a single transaction on the server, so a
    /// failed call leaves nothing behind.
    pub async fn rpc<T, P>(&self, function: &str, auth_token: Option<&str>, params: &P)
                           -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, auth_token, Some(params)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

//! Contentful Content Delivery / Preview API client.
//!
//! Only the two read calls a build needs: a content type descriptor and the
//! paginated entry list (with `includes` used to resolve links).

use std::time::Duration;

use async_trait::async_trait;
use entrypress_core::{
    ContentTypeDescriptor, CoreError, Entry, config::ContentfulConfig,
};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, info, instrument};

use crate::{
    error::{FetchError, Result},
    links::LinkIndex,
    source::{ContentSource, EntryQuery},
};

/// HTTP client for a single space.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: Client,
    base_url: String,
    access_token: String,
    include: u32,
    page_size: u32,
}

/// One page of `/entries`.
#[derive(Debug, Deserialize)]
struct EntriesPage {
    #[serde(default)]
    items: Vec<Entry>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    total: usize,
}

/// Records referenced by a page.
#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(rename = "Entry", default)]
    entries: Vec<Entry>,
    #[serde(rename = "Asset", default)]
    assets: Vec<Entry>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl DeliveryClient {
    /// Create a client from the `[contentful]` config section.
    ///
    /// Fails without touching the network when credentials are missing.
    pub fn new(config: &ContentfulConfig) -> Result<Self> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::missing_credential("access_token"))?;
        if config.space_id.as_deref().is_none_or(str::is_empty) {
            return Err(CoreError::missing_credential("space_id").into());
        }

        let base_url = config.base_url();
        let client = Client::builder()
            .user_agent(concat!("entrypress/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .build()
            .map_err(|source| FetchError::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url,
            access_token,
            include: config.include,
            page_size: config.page_size.max(1),
        })
    }

    /// Base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, ?query, "requesting");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

#[async_trait]
impl ContentSource for DeliveryClient {
    fn name(&self) -> &'static str {
        "contentful"
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn content_type(&self, id: &str) -> Result<ContentTypeDescriptor> {
        let mut descriptor: ContentTypeDescriptor =
            self.get_json(&format!("content_types/{id}"), &[]).await?;
        descriptor.id = id.to_string();

        info!(
            name = %descriptor.name,
            display_field = ?descriptor.display_field,
            "fetched content type"
        );
        Ok(descriptor)
    }

    #[instrument(skip(self), fields(base = %self.base_url, content_type = %query.content_type))]
    async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
        let mut items = Vec::new();
        let mut links = LinkIndex::new();
        let mut skip = 0usize;

        loop {
            let mut params = vec![
                ("content_type".to_string(), query.content_type.clone()),
                ("include".to_string(), self.include.to_string()),
                ("limit".to_string(), self.page_size.to_string()),
                ("skip".to_string(), skip.to_string()),
            ];
            params.extend(query.filters.iter().cloned());

            let page: EntriesPage = self.get_json("entries", &params).await?;
            let fetched = page.items.len();
            debug!(fetched, skip, total = page.total, "fetched entries page");

            for record in page.includes.entries {
                links.insert("Entry", record);
            }
            for record in page.includes.assets {
                links.insert("Asset", record);
            }
            for record in &page.items {
                links.insert("Entry", record.clone());
            }
            items.extend(page.items);

            skip += fetched;
            if fetched == 0 || skip >= page.total {
                break;
            }
        }

        for entry in &mut items {
            links.resolve(entry, self.include);
        }

        info!(count = items.len(), "fetched entries");
        Ok(items)
    }
}

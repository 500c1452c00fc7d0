use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::RowSink;
use crate::record::Record;

/// REST access to one hosted Postgres table, PostgREST conventions: the
/// project key rides on every call as both `apikey` and bearer auth, and
/// inserts go to `{project}/rest/v1/{table}` as a JSON array. No request
/// timeout is set; a stuck call stalls the run rather than failing it.
pub struct SupabaseTable {
    client: Client,
    endpoint: Url,
    table: String,
}

impl SupabaseTable {
    pub fn new(base_url: &str, key: &str, table: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .with_context(|| format!("parsing project URL {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("rest/v1/{table}"))
            .with_context(|| format!("building endpoint for table {table}"))?;

        let mut headers = header::HeaderMap::new();
        let mut apikey = header::HeaderValue::from_str(key)
            .context("project key is not a valid header value")?;
        apikey.set_sensitive(true);
        let mut bearer = header::HeaderValue::from_str(&format!("Bearer {key}"))
            .context("project key is not a valid header value")?;
        bearer.set_sensitive(true);
        headers.insert("apikey", apikey);
        headers.insert(header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            table: table.to_string(),
        })
    }

    /// Cheap reachability check: select a single row. The pipeline treats a
    /// failure here as fatal, before anything is written.
    pub async fn probe(&self) -> Result<()> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("limit", "1");
        debug!(url = %url, "probing table");
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("probing table {}", self.table))?;
        Ok(())
    }

    /// Exact row count via a bodyless HEAD; the total rides back in the
    /// `Content-Range` header. Callers treat this as best effort.
    pub async fn count_rows(&self) -> Result<u64> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("select", "file_id");
        let resp = self
            .client
            .head(url.clone())
            .header("Prefer", "count=exact")
            .send()
            .await
            .with_context(|| format!("HEAD {url}"))?
            .error_for_status()
            .with_context(|| format!("counting rows in table {}", self.table))?;

        let range = resp
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("response carried no Content-Range header"))?;
        parse_content_range_total(range)
            .ok_or_else(|| anyhow!("unparseable Content-Range {range:?}"))
    }
}

#[async_trait]
impl RowSink for SupabaseTable {
    /// One POST per batch with `Prefer: return=representation`, so a
    /// successful insert echoes the rows back. A 2xx with no echoed rows
    /// still counts as a failed batch.
    async fn insert_rows(&self, rows: &[Record]) -> Result<()> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("insert failed with {status}: {}", body.trim());
        }

        let returned: Value = resp
            .json()
            .await
            .context("decoding insert confirmation")?;
        match returned.as_array() {
            Some(rows) if !rows.is_empty() => Ok(()),
            _ => bail!("no data returned"),
        }
    }
}

/// Total from a PostgREST `Content-Range` value, e.g. `0-99/1234` or `*/0`
/// for an empty table. A `*` total means the count was not requested.
fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit('/').next()?.parse().ok()
}

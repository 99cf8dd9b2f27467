//! PostgREST mirror (the Supabase REST surface).

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};

use super::remote::{RemoteError, RemoteRow, RemoteTier, TABLE};
use crate::models::record::DailyRecord;

pub struct RestRemote {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRemote {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn select(&self, query: &[(&str, String)]) -> Result<Vec<RemoteRow>, RemoteError> {
        let response = self
            .authed(self.client.get(self.table_url()))
            .query(query)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status { status, body })
}

impl RemoteTier for RestRemote {
    async fn fetch(&self, date: NaiveDate) -> Result<Option<DailyRecord>, RemoteError> {
        let rows = self
            .select(&[("select", "*".to_string()), ("date", format!("eq.{date}"))])
            .await?;
        Ok(rows.into_iter().next().map(DailyRecord::from))
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<(), RemoteError> {
        let response = self
            .authed(self.client.post(self.table_url()))
            .query(&[("on_conflict", "date")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&RemoteRow::from(record))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<DailyRecord>, RemoteError> {
        let rows = self
            .select(&[("select", "*".to_string()), ("order", "date.asc".to_string())])
            .await?;
        Ok(rows.into_iter().map(DailyRecord::from).collect())
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        self.select(&[("select", "date".to_string()), ("limit", "1".to_string())])
            .await
            .map(|_| ())
    }
}

//! Supabase adapter for the profile store (PostgREST over HTTPS).
//!
//! Every port call is one (or two) REST round trips; there is no caching.
//! Rows live in three tables: `users`, `user_context`, `payments`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use tracing::debug;

use orb_core::{
    domain::{ContentPart, ContextEntry, PaymentRow, Role, UserId, UserPatch, UserRow},
    ports::ProfileStore,
    Error, Result,
};

#[derive(Clone, Debug)]
pub struct SupabaseStore {
    base_url: String,
    service_key: String,
    http: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            http,
        }
    }

    fn endpoint(&self, table: &str, filters: &str) -> String {
        if filters.is_empty() {
            format!("{}/rest/v1/{table}", self.base_url)
        } else {
            format!("{}/rest/v1/{table}?{filters}", self.base_url)
        }
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Store(format!("{what}: request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "{what}: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(resp)
    }

    async fn read_rows<T: serde::de::DeserializeOwned>(
        &self,
        resp: Response,
        what: &str,
    ) -> Result<Vec<T>> {
        resp.json::<Vec<T>>()
            .await
            .map_err(|e| Error::Store(format!("{what}: json error: {e}")))
    }
}

/// PostgREST `in.(...)` filter value for an id list.
fn ids_filter(ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

#[async_trait]
impl ProfileStore for SupabaseStore {
    async fn fetch_user(&self, user_id: UserId) -> Result<Option<UserRow>> {
        let url = self.endpoint("users", &format!("user_id=eq.{}&limit=1", user_id.0));
        let resp = self.send(self.auth(self.http.get(url)), "fetch_user").await?;
        let mut rows: Vec<UserRow> = self.read_rows(resp, "fetch_user").await?;
        Ok(rows.pop())
    }

    async fn insert_user(&self, row: &UserRow) -> Result<UserRow> {
        debug!(user_id = row.user_id, "creating user row");
        let url = self.endpoint("users", "");
        let req = self
            .auth(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(row);
        let resp = self.send(req, "insert_user").await?;
        let mut rows: Vec<UserRow> = self.read_rows(resp, "insert_user").await?;
        rows.pop()
            .ok_or_else(|| Error::Store("insert_user: empty representation".to_string()))
    }

    async fn update_user(&self, user_id: UserId, patch: &UserPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let url = self.endpoint("users", &format!("user_id=eq.{}", user_id.0));
        let req = self.auth(self.http.patch(url)).json(patch);
        self.send(req, "update_user").await?;
        Ok(())
    }

    async fn recent_context(&self, user_id: UserId, limit: usize) -> Result<Vec<ContextEntry>> {
        let url = self.endpoint(
            "user_context",
            &format!(
                "user_id=eq.{}&order=created_at.desc,id.desc&limit={limit}",
                user_id.0
            ),
        );
        let resp = self
            .send(self.auth(self.http.get(url)), "recent_context")
            .await?;
        self.read_rows(resp, "recent_context").await
    }

    async fn context_ids_newest_first(&self, user_id: UserId) -> Result<Vec<i64>> {
        let url = self.endpoint(
            "user_context",
            &format!(
                "user_id=eq.{}&select=id&order=created_at.desc,id.desc",
                user_id.0
            ),
        );
        let resp = self
            .send(self.auth(self.http.get(url)), "context_ids")
            .await?;
        let rows: Vec<serde_json::Value> = self.read_rows(resp, "context_ids").await?;
        Ok(rows
            .into_iter()
            .filter_map(|v| v.get("id").and_then(|id| id.as_i64()))
            .collect())
    }

    async fn insert_context(
        &self,
        user_id: UserId,
        role: Role,
        content: Vec<ContentPart>,
    ) -> Result<()> {
        let url = self.endpoint("user_context", "");
        let body = serde_json::json!({
            "user_id": user_id.0,
            "role": role,
            "content": content,
        });
        let req = self.auth(self.http.post(url)).json(&body);
        self.send(req, "insert_context").await?;
        Ok(())
    }

    async fn delete_context_by_ids(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.endpoint("user_context", &format!("id={}", ids_filter(ids)));
        self.send(self.auth(self.http.delete(url)), "delete_context_by_ids")
            .await?;
        Ok(())
    }

    async fn delete_context(&self, user_id: UserId) -> Result<()> {
        let url = self.endpoint("user_context", &format!("user_id=eq.{}", user_id.0));
        self.send(self.auth(self.http.delete(url)), "delete_context")
            .await?;
        Ok(())
    }

    async fn insert_payment(&self, row: &PaymentRow) -> Result<()> {
        let url = self.endpoint("payments", "");
        let req = self.auth(self.http.post(url)).json(row);
        self.send(req, "insert_payment").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SupabaseStore {
        SupabaseStore::new(
            "https://example.supabase.co/",
            "service-key",
            Duration::from_secs(10),
        )
    }

    #[test]
    fn trailing_slash_is_stripped_from_the_base_url() {
        let url = store().endpoint("users", "user_id=eq.7&limit=1");
        assert_eq!(
            url,
            "https://example.supabase.co/rest/v1/users?user_id=eq.7&limit=1"
        );
    }

    #[test]
    fn endpoint_without_filters_has_no_query_string() {
        assert_eq!(
            store().endpoint("payments", ""),
            "https://example.supabase.co/rest/v1/payments"
        );
    }

    #[test]
    fn ids_filter_builds_a_postgrest_in_list() {
        assert_eq!(ids_filter(&[3, 1, 2]), "in.(3,1,2)");
        assert_eq!(ids_filter(&[42]), "in.(42)");
    }
}

use crate::config::ClientConfig;
use crate::error::{DashboardError, Result};
use crate::types::{
    Alert, Category, CpuMetrics, DiskMetrics, NetworkMetrics, Payload, ProcessInfo, RamMetrics,
    SystemInfo,
};
use futures_util::future::join_all;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the metrics API. Cheap to clone; clones share one
/// connection pool.
#[derive(Clone, Debug)]
pub struct MetricsClient {
    client: Client,
    base: Url,
}

impl MetricsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|err| DashboardError::Config(format!("invalid base URL '{base_url}': {err}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DashboardError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, category: Category) -> Result<T> {
        let network = |reason: String| DashboardError::Network { category, reason };
        let resp = self
            .client
            .get(self.endpoint(&category.path()))
            .send()
            .await
            .map_err(|err| network(err.to_string()))?;
        if !resp.status().is_success() {
            return Err(network(format!("status {}", resp.status())));
        }
        let body = resp.text().await.map_err(|err| network(err.to_string()))?;
        serde_json::from_str(&body).map_err(|source| DashboardError::Parse { category, source })
    }

    pub async fn fetch_cpu(&self) -> Result<CpuMetrics> {
        self.get_json(Category::Cpu).await
    }

    pub async fn fetch_ram(&self) -> Result<RamMetrics> {
        self.get_json(Category::Ram).await
    }

    pub async fn fetch_disk(&self) -> Result<DiskMetrics> {
        self.get_json(Category::Disk).await
    }

    pub async fn fetch_network(&self) -> Result<NetworkMetrics> {
        self.get_json(Category::Network).await
    }

    pub async fn fetch_system_info(&self) -> Result<SystemInfo> {
        self.get_json(Category::SystemInfo).await
    }

    pub async fn fetch_processes(&self) -> Result<Vec<ProcessInfo>> {
        self.get_json(Category::Processes).await
    }

    pub async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        self.get_json(Category::Alerts).await
    }

    /// Fetches one category. Failures are logged here and handed back so the
    /// caller can skip that category for the cycle.
    pub async fn fetch(&self, category: Category) -> Result<Payload> {
        let result = match category {
            Category::Cpu => self.fetch_cpu().await.map(Payload::Cpu),
            Category::Ram => self.fetch_ram().await.map(Payload::Ram),
            Category::Disk => self.fetch_disk().await.map(Payload::Disk),
            Category::Network => self.fetch_network().await.map(Payload::Network),
            Category::SystemInfo => self.fetch_system_info().await.map(Payload::SystemInfo),
            Category::Processes => self.fetch_processes().await.map(Payload::Processes),
            Category::Alerts => self.fetch_alerts().await.map(Payload::Alerts),
        };
        match &result {
            Ok(_) => debug!("[client] fetched {category}"),
            Err(err) => warn!("[client] {err}"),
        }
        result
    }

    /// Fetches every category concurrently and waits for all of them to
    /// settle. One category failing never fails the others.
    pub async fn fetch_all(&self) -> Vec<(Category, Result<Payload>)> {
        let fetches = Category::ALL
            .iter()
            .map(|&category| async move { (category, self.fetch(category).await) });
        join_all(fetches).await
    }

    pub async fn resolve_alert(&self, id: i64) -> Result<()> {
        let action = |reason: String| DashboardError::Action { id, reason };
        let resp = self
            .client
            .post(self.endpoint(&format!("/api/resolve-alert/{id}")))
            .send()
            .await
            .map_err(|err| action(err.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(action(format!("status {}", resp.status())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> MetricsClient {
        MetricsClient::new(&server.base_url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn fetch_cpu_parses_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/cpu");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"percentage":42.5,"cores":4,"frequency":{"current":2400.0}}"#);
            })
            .await;

        let cpu = client_for(&server).fetch_cpu().await.unwrap();
        assert_eq!(cpu.percentage, 42.5);
        assert_eq!(cpu.frequency.map(|f| f.current), Some(2400.0));
    }

    #[tokio::test]
    async fn error_status_is_a_network_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/disk");
                then.status(503);
            })
            .await;

        let err = client_for(&server).fetch(Category::Disk).await.unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Network {
                category: Category::Disk,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn wrong_shape_is_a_parse_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/ram");
                then.status(200).body(r#"{"percentage":"lots"}"#);
            })
            .await;

        let err = client_for(&server).fetch(Category::Ram).await.unwrap_err();
        assert!(matches!(err, DashboardError::Parse { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_fails_every_category_without_panicking() {
        let client = MetricsClient::new("http://127.0.0.1:59998", Duration::from_millis(500)).unwrap();
        let outcomes = client.fetch_all().await;
        assert_eq!(outcomes.len(), 7);
        assert!(outcomes.iter().all(|(_, result)| result.is_err()));
    }

    #[tokio::test]
    async fn resolve_reports_rejection() {
        let server = MockServer::start_async().await;
        let resolve = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/resolve-alert/7");
                then.status(404);
            })
            .await;

        let err = client_for(&server).resolve_alert(7).await.unwrap_err();
        assert!(matches!(err, DashboardError::Action { id: 7, .. }));
        resolve.assert_async().await;
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = MetricsClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }
}

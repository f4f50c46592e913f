// HTTP data client for the dataset query API
use crate::application::data_client::{
    dataset_list, normalize_rows, query_text, DataClient, DatasetSummary, QueryParams,
};
use crate::application::error::{DashboardError, Result};
use crate::domain::ids::WorkspaceId;
use async_trait::async_trait;
use reqwest::Response;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_DATA_BASE_URL: &str = "https://api.fabric.microsoft.com/v1";

#[derive(Debug, Clone)]
pub struct HttpDataClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ExecuteQueries {
    queries: Vec<QueryText>,
}

#[derive(Debug, Serialize)]
struct QueryText {
    query: String,
}

impl Default for HttpDataClient {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_BASE_URL)
    }
}

impl HttpDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn read_json(response: Response, what: &str) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("{} failed with status {}: {}", what, status, message);
            return Err(DashboardError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DataClient for HttpDataClient {
    async fn get_datasets(&self, workspace_id: &WorkspaceId) -> Result<Vec<DatasetSummary>> {
        let url = format!(
            "{}/workspaces/{}/datasets",
            self.base_url,
            urlencoding::encode(workspace_id.as_str())
        );
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        dataset_list(Self::read_json(response, "Dataset listing").await?)
    }

    async fn execute_query(&self, params: &QueryParams) -> Result<Vec<Value>> {
        let url = format!(
            "{}/workspaces/{}/datasets/{}/executeQueries",
            self.base_url,
            urlencoding::encode(params.workspace_id.as_str()),
            urlencoding::encode(params.dataset_id.as_str())
        );
        let body = ExecuteQueries {
            queries: vec![QueryText {
                query: query_text(&params.query)?,
            }],
        };
        let response = self.client.post(&url).json(&body).send().await?;
        let rows = normalize_rows(Self::read_json(response, "Query execution").await?);
        tracing::debug!("Query on {} returned {} rows", params.dataset_id, rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::{DataQuery, QueryObject};
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn(router: Router) -> HttpDataClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpDataClient::new(format!("http://{}/v1", addr))
    }

    fn params(query: DataQuery) -> QueryParams {
        QueryParams {
            workspace_id: "ws1".into(),
            dataset_id: "sales".into(),
            query,
        }
    }

    #[tokio::test]
    async fn test_execute_query_posts_encoded_query_and_flattens_rows() {
        // Echo the received query back inside the nested envelope.
        let router = Router::new().route(
            "/v1/workspaces/:ws/datasets/:ds/executeQueries",
            post(|Path((ws, ds)): Path<(String, String)>, Json(body): Json<Value>| async move {
                Json(json!({"results": [{"tables": [{"rows": [
                    {"ws": ws, "ds": ds, "query": body["queries"][0]["query"]}
                ]}]}]}))
            }),
        );
        let client = spawn(router).await;

        let structured = DataQuery::Structured(QueryObject {
            table: "orders".to_string(),
            columns: vec!["total".to_string()],
            filters: None,
            order_by: None,
            limit: None,
        });
        let rows = client.execute_query(&params(structured)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ws"], "ws1");
        assert_eq!(rows[0]["ds"], "sales");
        let sent: Value = serde_json::from_str(rows[0]["query"].as_str().unwrap()).unwrap();
        assert_eq!(sent, json!({"table": "orders", "columns": ["total"]}));

        let rows = client
            .execute_query(&params(DataQuery::Text("EVALUATE orders".to_string())))
            .await
            .unwrap();
        assert_eq!(rows[0]["query"], "EVALUATE orders");
    }

    #[tokio::test]
    async fn test_get_datasets_and_failure_status() {
        let router = Router::new()
            .route(
                "/v1/workspaces/ws1/datasets",
                get(|| async { Json(json!({"datasets": [{"id": "sales", "name": "Sales"}]})) }),
            )
            .route(
                "/v1/workspaces/ws1/datasets/sales/executeQueries",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            );
        let client = spawn(router).await;

        let datasets = client.get_datasets(&"ws1".into()).await.unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].name, "Sales");

        let err = client
            .execute_query(&params(DataQuery::Text("x".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Rejected { status: 502, .. }));
    }
}

// Data client - Dataset discovery and query execution against the data backend
use crate::application::error::Result;
use crate::domain::ids::{DatasetId, WorkspaceId};
use crate::domain::widget::DataQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub workspace_id: WorkspaceId,
    pub dataset_id: DatasetId,
    pub query: DataQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableSummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Datetime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: ColumnType,
}

#[async_trait]
pub trait DataClient: Send + Sync {
    async fn get_datasets(&self, workspace_id: &WorkspaceId) -> Result<Vec<DatasetSummary>>;

    /// Run `params.query` and return flat rows, whatever envelope the
    /// backend wrapped them in.
    async fn execute_query(&self, params: &QueryParams) -> Result<Vec<Value>>;
}

/// The query as the backend expects it: text passes through, structured
/// queries are sent as their JSON encoding.
pub fn query_text(query: &DataQuery) -> Result<String> {
    match query {
        DataQuery::Text(text) => Ok(text.clone()),
        DataQuery::Structured(object) => Ok(serde_json::to_string(object)?),
    }
}

/// Flatten a query response into rows.
///
/// Recognised shapes, in order: `{results:[{tables:[{rows}]}]}`, a bare
/// array, `{rows}`. Any other object becomes a single row; scalars and null
/// yield nothing.
pub fn normalize_rows(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(rows) => rows,
        Value::Object(mut object) => {
            let nested = object
                .get_mut("results")
                .and_then(|results| results.get_mut(0))
                .and_then(|result| result.get_mut("tables"))
                .and_then(|tables| tables.get_mut(0))
                .and_then(|table| table.get_mut("rows"))
                .and_then(|rows| match rows.take() {
                    Value::Array(rows) => Some(rows),
                    _ => None,
                });
            if let Some(rows) = nested {
                return rows;
            }
            match object.remove("rows") {
                Some(Value::Array(rows)) => rows,
                Some(Value::Null) | None => vec![Value::Object(object)],
                Some(other) => {
                    object.insert("rows".to_string(), other);
                    vec![Value::Object(object)]
                }
            }
        }
        _ => Vec::new(),
    }
}

/// Accept either `{datasets:[...]}` or a bare array.
pub fn dataset_list(raw: Value) -> Result<Vec<DatasetSummary>> {
    let list = match raw {
        Value::Object(mut object) if object.contains_key("datasets") => {
            object.remove("datasets").unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

//! Firestore-backed document store using the v1 REST API.
//!
//! Each [`DocumentStore`] operation maps onto one REST call:
//!
//! | Operation       | Request                                              |
//! |-----------------|------------------------------------------------------|
//! | `list`          | `GET  {root}/{collection}?pageSize=..&pageToken=..`  |
//! | `find_by_field` | `POST {root}:runQuery` with an `EQUAL` field filter  |
//! | `add`           | `POST {root}/{collection}`                           |
//! | `set`           | `PATCH {root}/{collection}/{id}[?updateMask..]`      |
//! | `delete`        | `DELETE {root}/{collection}/{id}`                    |
//!
//! where `{root}` is `{endpoint}/v1/projects/{project}/databases/{db}/documents`.
//!
//! A bearer access token is attached when configured. The Firestore emulator
//! accepts unauthenticated requests, so the token is optional.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::error::StoreError;

use super::value::{decode_fields, encode_fields, encode_value};
use super::{merge_paths, Document, DocumentStore, Fields, WriteMode};

/// Public Firestore endpoint.
pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Name of the default database in a project.
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";

/// Page size used when listing a collection.
const LIST_PAGE_SIZE: u32 = 300;

/// Document store talking to Firestore over HTTPS.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    root: Url,
    access_token: Option<String>,
}

impl FirestoreStore {
    /// Create a store for `project`/`database` served at `endpoint`.
    pub fn new(
        client: Client,
        endpoint: &str,
        project: &str,
        database: &str,
    ) -> Result<Self, StoreError> {
        let mut root = Url::parse(endpoint)
            .map_err(|e| StoreError::Connection(format!("invalid endpoint {}: {}", endpoint, e)))?;
        root.path_segments_mut()
            .map_err(|_| StoreError::Connection(format!("invalid endpoint {}", endpoint)))?
            .pop_if_empty()
            .extend(["v1", "projects", project, "databases", database, "documents"]);

        Ok(Self {
            client,
            root,
            access_token: None,
        })
    }

    /// Attach an OAuth bearer token to every request.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// The `.../documents` URL all requests are built from.
    pub fn root(&self) -> &Url {
        &self.root
    }

    fn collection_url(&self, collection: &str) -> Url {
        self.url_with_segments(&[collection])
    }

    fn document_url(&self, collection: &str, id: &str) -> Url {
        self.url_with_segments(&[collection, id])
    }

    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn run_query_url(&self) -> String {
        format!("{}:runQuery", self.root.as_str().trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        check_status(response).await
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value, StoreError> {
        self.send(request)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into [`StoreError::Backend`], keeping the
/// server's own message when it sent one.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Parse a REST `Document` resource.
fn parse_document(raw: &Value) -> Result<Document, StoreError> {
    let name = raw["name"]
        .as_str()
        .ok_or_else(|| StoreError::Decode("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = decode_fields(raw.get("fields"))?;
    Ok(Document { id, fields })
}

/// Render a field path, quoting segments that are not plain identifiers.
fn field_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| quote_segment(segment))
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        segment.to_string()
    } else {
        format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection);
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &LIST_PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page = self.send_json(self.client.get(url)).await?;
            if let Some(raw_docs) = page["documents"].as_array() {
                for raw in raw_docs {
                    documents.push(parse_document(raw)?);
                }
            }

            match page["nextPageToken"].as_str() {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(collection, count = documents.len(), "Listed collection");
        Ok(documents)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": quote_segment(field) },
                        "op": "EQUAL",
                        "value": encode_value(value),
                    }
                }
            }
        });

        let results = self
            .send_json(self.client.post(self.run_query_url()).json(&body))
            .await?;

        // runQuery streams one entry per match, plus entries carrying only a
        // readTime when nothing matched.
        results
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("document"))
                    .map(parse_document)
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let body = json!({ "fields": encode_fields(&fields) });
        let created = self
            .send_json(self.client.post(self.collection_url(collection)).json(&body))
            .await?;
        let document = parse_document(&created)?;
        debug!(collection, id = %document.id, "Added document");
        Ok(document.id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let mut url = self.document_url(collection, id);

        if mode == WriteMode::Merge {
            let paths = merge_paths(&fields);
            if paths.is_empty() {
                // Without a mask Firestore would replace the document
                return Ok(());
            }
            let mut query = url.query_pairs_mut();
            for path in &paths {
                query.append_pair("updateMask.fieldPaths", &field_path(path));
            }
        }

        let body = json!({ "fields": encode_fields(&fields) });
        self.send(self.client.patch(url).json(&body)).await?;
        debug!(collection, id, ?mode, "Wrote document");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let request = self.client.delete(self.document_url(collection, id));
        match self.send(request).await {
            Ok(_) => Ok(()),
            Err(StoreError::Backend { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

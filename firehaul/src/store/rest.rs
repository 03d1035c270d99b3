//! Firestore v1 REST client.
//!
//! Speaks the public `projects.databases.documents` surface: paginated
//! document listing plus `:listCollectionIds` for collection discovery.
//! Field values arrive in the wire encoding (`stringValue`, `mapValue`,
//! …) and decode into [`FieldValue`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::value::{FieldMap, FieldValue, GeoPoint, Timestamp};

use super::{CollectionRef, DocumentStore, SourceDocument};

const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1/";
const PAGE_SIZE: usize = 300;

/// Credential presented to the REST surface.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// OAuth2 access token (service account or user credential).
    Bearer(String),
    /// The emulator's `owner` pseudo-token; only honored by an emulator.
    EmulatorOwner,
}

impl AuthMethod {
    fn token(&self) -> &str {
        match self {
            AuthMethod::Bearer(token) => token,
            AuthMethod::EmulatorOwner => "owner",
        }
    }
}

/// REST-backed [`DocumentStore`].
pub struct RestStore {
    client: reqwest::Client,
    base: Url,
    /// `projects/{project}/databases/(default)/documents`
    parent: String,
    auth: AuthMethod,
    page_size: usize,
}

impl RestStore {
    /// Client for the hosted endpoint.
    pub fn new(project_id: &str, token: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, project_id, AuthMethod::Bearer(token.into()))
    }

    /// Client for a local emulator at `host` (`host:port`).
    pub fn emulator(host: &str, project_id: &str) -> Result<Self> {
        Self::with_endpoint(
            &format!("http://{host}/v1/"),
            project_id,
            AuthMethod::EmulatorOwner,
        )
    }

    pub fn with_endpoint(endpoint: &str, project_id: &str, auth: AuthMethod) -> Result<Self> {
        if project_id.is_empty() {
            return Err(Error::Config("project id must not be empty".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base: Url::parse(endpoint)?,
            parent: format!("projects/{project_id}/databases/(default)/documents"),
            auth,
            page_size: PAGE_SIZE,
        })
    }

    async fn get_json(&self, url: Url) -> Result<JsonValue> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.token())
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn post_json(&self, url: Url, body: &JsonValue) -> Result<JsonValue> {
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.token())
            .json(body)
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> Result<JsonValue> {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Credential(format!(
                "store rejected credentials (status {status})"
            ))),
            _ if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(Error::Status {
                    status: status.as_u16(),
                    message: message.chars().take(300).collect(),
                })
            }
            _ => Ok(response.json().await?),
        }
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn list_collections(&self, parent: Option<&str>) -> Result<Vec<CollectionRef>> {
        let resource = match parent {
            Some(doc_path) => format!("{}/{doc_path}", self.parent),
            None => self.parent.clone(),
        };
        let scope = parent.unwrap_or("(root)");

        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = self.base.join(&format!("{resource}:listCollectionIds"))?;
            let mut body = json!({ "pageSize": self.page_size });
            if let Some(token) = &page_token {
                body["pageToken"] = json!(token);
            }
            let page = self
                .post_json(url, &body)
                .await
                .map_err(|e| e.scoped_to(scope))?;

            if let Some(listed) = page.get("collectionIds").and_then(JsonValue::as_array) {
                ids.extend(
                    listed
                        .iter()
                        .filter_map(JsonValue::as_str)
                        .map(str::to_string),
                );
            }
            match page.get("nextPageToken").and_then(JsonValue::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }
        debug!(scope, count = ids.len(), "listed collections");

        Ok(ids
            .into_iter()
            .map(|id| match parent {
                Some(doc_path) => CollectionRef::nested(doc_path, id),
                None => CollectionRef::root(id),
            })
            .collect())
    }

    async fn fetch_documents(&self, collection: &CollectionRef) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self
                .base
                .join(&format!("{}/{}", self.parent, collection.path))?;
            url.query_pairs_mut()
                .append_pair("pageSize", &self.page_size.to_string());
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let page = self
                .get_json(url)
                .await
                .map_err(|e| e.scoped_to(&collection.path))?;

            if let Some(fetched) = page.get("documents").and_then(JsonValue::as_array) {
                for raw in fetched {
                    documents
                        .push(decode_document(raw).map_err(|e| e.scoped_to(&collection.path))?);
                }
            }
            match page.get("nextPageToken").and_then(JsonValue::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }
        debug!(collection = %collection.path, count = documents.len(), "fetched documents");
        Ok(documents)
    }
}

/// Decode one wire document (`name` + `fields`) into a [`SourceDocument`].
fn decode_document(raw: &JsonValue) -> Result<SourceDocument> {
    let name = raw
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::Decode("document without a resource name".to_string()))?;
    let id = name
        .rsplit('/')
        .next()
        .unwrap_or(name)
        .to_string();

    let mut fields: FieldMap = Vec::new();
    if let Some(object) = raw.get("fields").and_then(JsonValue::as_object) {
        for (key, value) in object {
            fields.push((key.clone(), decode_wire_value(value)?));
        }
    }
    Ok(SourceDocument { id, fields })
}

/// Decode one wire value. The encoding is a tagged union with exactly one
/// populated member per value.
fn decode_wire_value(value: &JsonValue) -> Result<FieldValue> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::Decode(format!("malformed wire value: {value}")))?;
    let (tag, inner) = object
        .iter()
        .next()
        .ok_or_else(|| Error::Decode("empty wire value".to_string()))?;

    match tag.as_str() {
        "nullValue" => Ok(FieldValue::Null),
        "booleanValue" => inner
            .as_bool()
            .map(FieldValue::Boolean)
            .ok_or_else(|| decode_err(tag, inner)),
        // 64-bit integers travel as strings.
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| inner.as_i64())
            .map(FieldValue::Integer)
            .ok_or_else(|| decode_err(tag, inner)),
        "doubleValue" => decode_wire_double(inner).ok_or_else(|| decode_err(tag, inner)),
        "stringValue" => inner
            .as_str()
            .map(|s| FieldValue::String(s.to_string()))
            .ok_or_else(|| decode_err(tag, inner)),
        "timestampValue" => Ok(decode_wire_timestamp(inner)),
        "geoPointValue" => {
            // LatLng omits zero members on the wire.
            let latitude = inner.get("latitude").and_then(JsonValue::as_f64).unwrap_or(0.0);
            let longitude = inner
                .get("longitude")
                .and_then(JsonValue::as_f64)
                .unwrap_or(0.0);
            Ok(FieldValue::GeoPoint(GeoPoint {
                latitude,
                longitude,
            }))
        }
        "referenceValue" => inner
            .as_str()
            .map(|name| FieldValue::Reference(relativize_reference(name)))
            .ok_or_else(|| decode_err(tag, inner)),
        "bytesValue" => inner
            .as_str()
            .ok_or_else(|| decode_err(tag, inner))
            .and_then(|encoded| {
                BASE64
                    .decode(encoded)
                    .map(FieldValue::Bytes)
                    .map_err(|e| Error::Decode(format!("invalid bytesValue: {e}")))
            }),
        "arrayValue" => {
            let mut items = Vec::new();
            if let Some(values) = inner.get("values").and_then(JsonValue::as_array) {
                for item in values {
                    items.push(decode_wire_value(item)?);
                }
            }
            Ok(FieldValue::Array(items))
        }
        "mapValue" => {
            let mut fields: FieldMap = Vec::new();
            if let Some(entries) = inner.get("fields").and_then(JsonValue::as_object) {
                for (key, entry) in entries {
                    fields.push((key.clone(), decode_wire_value(entry)?));
                }
            }
            Ok(FieldValue::Map(fields))
        }
        other => Err(Error::Decode(format!("unknown wire value tag '{other}'"))),
    }
}

fn decode_err(tag: &str, inner: &JsonValue) -> Error {
    Error::Decode(format!("malformed {tag}: {inner}"))
}

fn decode_wire_double(inner: &JsonValue) -> Option<FieldValue> {
    if let Some(d) = inner.as_f64() {
        return Some(FieldValue::Double(d));
    }
    // Non-finite doubles travel as strings.
    match inner.as_str()? {
        "NaN" => Some(FieldValue::Double(f64::NAN)),
        "Infinity" => Some(FieldValue::Double(f64::INFINITY)),
        "-Infinity" => Some(FieldValue::Double(f64::NEG_INFINITY)),
        _ => None,
    }
}

fn decode_wire_timestamp(inner: &JsonValue) -> FieldValue {
    match inner
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
    {
        Some(parsed) => {
            FieldValue::Timestamp(Timestamp::from_datetime(parsed.with_timezone(&Utc)))
        }
        None => {
            warn!(value = %inner, "unparseable timestampValue, keeping it as a string");
            FieldValue::String(inner.as_str().unwrap_or_default().to_string())
        }
    }
}

/// `projects/p/databases/d/documents/users/u1` → `users/u1`. Names from a
/// foreign database are kept whole rather than mis-relativized.
fn relativize_reference(name: &str) -> String {
    match name.split_once("/documents/") {
        Some((_, path)) => path.to_string(),
        None => name.to_string(),
    }
}

// Firestore REST API client
// Using service account JWT authentication

use anyhow::{anyhow, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::utils::config::{LIST_PAGE_SIZE, TOKEN_REFRESH_BUFFER_SECS, TOKEN_TTL_SECS};

/// Firebase service account credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub private_key: String,
    pub client_email: String,
}

/// JWT claims for Google OAuth2
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    sub: String,
    aud: String,
    iat: u64,
    exp: u64,
    scope: String,
}

/// Cached access token
struct CachedToken {
    token: String,
    expires_at: u64,
}

/// Atomic field transform attached to a write
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    /// Add `by` to a numeric field on the server
    Increment { field: String, by: i64 },
    /// Set a field to the server's commit timestamp
    ServerTimestamp { field: String },
}

impl FieldTransform {
    fn to_json(&self) -> Value {
        match self {
            FieldTransform::Increment { field, by } => json!({
                "fieldPath": field,
                "increment": { "integerValue": by.to_string() }
            }),
            FieldTransform::ServerTimestamp { field } => json!({
                "fieldPath": field,
                "setToServerValue": "REQUEST_TIME"
            }),
        }
    }
}

/// Write operation for transactions and batches.
/// `path` is a document path relative to the database root,
/// e.g. "users/u1/courseAccess/c1".
#[derive(Debug, Clone)]
pub enum Write {
    /// Merge `fields` into a document (created if absent), applying
    /// `transforms` atomically in the same write
    Set {
        path: String,
        fields: Value,
        transforms: Vec<FieldTransform>,
    },
    /// Delete a document
    Delete { path: String },
}

impl Write {
    /// Merge-set without transforms
    pub fn set(path: impl Into<String>, fields: Value) -> Self {
        Write::Set {
            path: path.into(),
            fields,
            transforms: Vec::new(),
        }
    }

    /// Merge-set with transforms
    pub fn set_with(path: impl Into<String>, fields: Value, transforms: Vec<FieldTransform>) -> Self {
        Write::Set {
            path: path.into(),
            fields,
            transforms,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Write::Delete { path: path.into() }
    }
}

/// Firestore REST API client
pub struct FirestoreClient {
    client: Client,
    service_account: ServiceAccount,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl FirestoreClient {
    /// Create a new Firestore client from a service account JSON file
    pub fn from_file(client: Client, path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let service_account: ServiceAccount = serde_json::from_str(&content)?;

        Ok(Self {
            client,
            service_account,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.service_account.project_id
    }

    /// Get access token (with caching)
    async fn get_access_token(&self) -> Result<String> {
        // Check cache first
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                if cached.expires_at > now + TOKEN_REFRESH_BUFFER_SECS {
                    return Ok(cached.token.clone());
                }
            }
        }

        // Generate new token
        let token = self.generate_access_token().await?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at: now + TOKEN_TTL_SECS,
            });
        }

        Ok(token)
    }

    /// Generate a new access token using JWT
    async fn generate_access_token(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let claims = Claims {
            iss: self.service_account.client_email.clone(),
            sub: self.service_account.client_email.clone(),
            aud: "https://oauth2.googleapis.com/token".to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            scope: "https://www.googleapis.com/auth/datastore".to_string(),
        };

        let key = EncodingKey::from_rsa_pem(self.service_account.private_key.as_bytes())?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        // Exchange JWT for access token
        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await?;
            error!("Failed to get access token: {}", body);
            return Err(anyhow!("Failed to get access token"));
        }

        let data: Value = response.json().await?;
        let token = data["access_token"]
            .as_str()
            .ok_or_else(|| anyhow!("No access_token in response"))?;

        Ok(token.to_string())
    }

    /// Base URL for document endpoints
    fn base_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.service_account.project_id
        )
    }

    /// Fully qualified resource name for a document path
    fn doc_name(&self, path: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}",
            self.service_account.project_id, path
        )
    }

    /// Get a document by path
    pub async fn get_document(&self, path: &str) -> Result<Option<Value>> {
        let token = self.get_access_token().await?;
        let url = format!("{}/{}", self.base_url(), path);

        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        if response.status() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore error: {}", body);
            return Err(anyhow!("Firestore error: {}", status));
        }

        let doc: Value = response.json().await?;
        Ok(Some(from_firestore_document(&doc)))
    }

    /// Merge-set a document by path (created if absent)
    pub async fn set_document(&self, path: &str, data: &Value) -> Result<()> {
        let token = self.get_access_token().await?;

        // Build updateMask from top-level field names
        let field_paths: String = data
            .as_object()
            .map(|obj| {
                obj.keys()
                    .map(|k| format!("updateMask.fieldPaths={}", k))
                    .collect::<Vec<_>>()
                    .join("&")
            })
            .unwrap_or_default();

        let url = format!("{}/{}?{}", self.base_url(), path, field_paths);
        let firestore_doc = to_firestore_document(data);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&token)
            .json(&firestore_doc)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore error: {}", body);
            return Err(anyhow!("Firestore error: {}", status));
        }

        Ok(())
    }

    /// Delete a document by path
    pub async fn delete_document(&self, path: &str) -> Result<()> {
        let token = self.get_access_token().await?;
        let url = format!("{}/{}", self.base_url(), path);

        let response = self.client.delete(&url).bearer_auth(&token).send().await?;

        if !response.status().is_success() && response.status() != 404 {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore delete error: {}", body);
            return Err(anyhow!("Firestore delete error: {}", status));
        }

        Ok(())
    }

    /// List all documents in a collection - returns (id, data) tuples.
    /// Handles pagination to fetch ALL documents.
    pub async fn list_collection(&self, collection_path: &str) -> Result<Vec<(String, Value)>> {
        let token = self.get_access_token().await?;
        let base_url = format!("{}/{}", self.base_url(), collection_path);

        let mut all_docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}?pageSize={}", base_url, LIST_PAGE_SIZE);
            if let Some(ref t) = page_token {
                url.push_str(&format!("&pageToken={}", t));
            }

            let response = self.client.get(&url).bearer_auth(&token).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await?;
                debug!("Firestore error: {}", body);
                return Err(anyhow!("Firestore error: {}", status));
            }

            let result: Value = response.json().await?;

            if let Some(arr) = result["documents"].as_array() {
                for doc in arr {
                    if let Some(id) = doc["name"]
                        .as_str()
                        .and_then(|name| name.split('/').last())
                        .map(|s| s.to_string())
                    {
                        let data = from_firestore_document(doc);
                        all_docs.push((id, data));
                    }
                }
            }

            match result.get("nextPageToken") {
                Some(t) => {
                    if let Some(t_str) = t.as_str() {
                        page_token = Some(t_str.to_string());
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }

        Ok(all_docs)
    }

    /// Run a structured query on a subcollection with server-side ordering.
    /// `parent_path` is a document path ("" for the database root).
    /// Returns Vec<(doc_id, data)>.
    pub async fn run_query(
        &self,
        parent_path: &str,
        collection_id: &str,
        order_by: Option<(&str, &str)>,
        limit: usize,
    ) -> Result<Vec<(String, Value)>> {
        let token = self.get_access_token().await?;

        let parent = if parent_path.is_empty() {
            format!(
                "projects/{}/databases/(default)/documents",
                self.service_account.project_id
            )
        } else {
            self.doc_name(parent_path)
        };
        let url = format!("https://firestore.googleapis.com/v1/{}:runQuery", parent);

        let mut query = json!({
            "from": [{ "collectionId": collection_id }],
            "limit": limit
        });

        if let Some((field, direction)) = order_by {
            query["orderBy"] = json!([{
                "field": { "fieldPath": field },
                "direction": direction
            }]);
        }

        let body = json!({ "structuredQuery": query });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore query error: {}", body);
            return Err(anyhow!("Firestore query error: {}", status));
        }

        // Response is an array of { document: {...} } or { readTime: ... }
        let results: Vec<Value> = response.json().await?;
        let mut docs = Vec::new();

        for item in results {
            if let Some(doc) = item.get("document") {
                if let Some(name) = doc["name"].as_str() {
                    let id = name.split('/').last().unwrap_or("").to_string();
                    let data = from_firestore_document(doc);
                    docs.push((id, data));
                }
            }
        }

        Ok(docs)
    }

    // ============ Transactions & batches ============

    /// Begin a new Firestore transaction. Returns the transaction ID.
    pub async fn begin_transaction(&self) -> Result<String> {
        let token = self.get_access_token().await?;
        let url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents:beginTransaction",
            self.service_account.project_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore beginTransaction error: {}", body);
            return Err(anyhow!("Firestore beginTransaction error: {}", status));
        }

        let result: Value = response.json().await?;
        let tx_id = result["transaction"]
            .as_str()
            .ok_or_else(|| anyhow!("No transaction ID in response"))?;

        Ok(tx_id.to_string())
    }

    /// Roll back a transaction without committing any writes
    pub async fn rollback_transaction(&self, transaction_id: &str) -> Result<()> {
        let token = self.get_access_token().await?;
        let url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents:rollback",
            self.service_account.project_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "transaction": transaction_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore rollback error: {}", body);
            return Err(anyhow!("Firestore rollback error: {}", status));
        }

        Ok(())
    }

    /// Commit a list of writes atomically. With `transaction_id`, this
    /// concludes a read-then-write transaction; without it, the writes form
    /// an all-or-nothing batch.
    pub async fn commit(&self, transaction_id: Option<&str>, writes: Vec<Write>) -> Result<()> {
        let token = self.get_access_token().await?;
        let url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents:commit",
            self.service_account.project_id
        );

        let write_objects: Vec<Value> = writes.iter().map(|w| self.write_to_json(w)).collect();

        let mut body = json!({ "writes": write_objects });
        if let Some(tx) = transaction_id {
            body["transaction"] = json!(tx);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore commit error: {}", body);
            return Err(anyhow!("Firestore commit error: {}", status));
        }

        Ok(())
    }

    /// Read a document within a transaction context
    pub async fn get_document_in_transaction(
        &self,
        transaction_id: &str,
        path: &str,
    ) -> Result<Option<Value>> {
        let token = self.get_access_token().await?;
        let url = format!(
            "{}/{}?transaction={}",
            self.base_url(),
            path,
            transaction_id
        );

        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        if response.status() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            debug!("Firestore error: {}", body);
            return Err(anyhow!("Firestore error: {}", status));
        }

        let doc: Value = response.json().await?;
        Ok(Some(from_firestore_document(&doc)))
    }

    /// Serialize a write to the commit API shape
    fn write_to_json(&self, write: &Write) -> Value {
        match write {
            Write::Delete { path } => {
                json!({ "delete": self.doc_name(path) })
            }
            Write::Set {
                path,
                fields,
                transforms,
            } => {
                // Transform-only writes use the dedicated shape
                if transforms.is_empty() || fields.as_object().map_or(true, |o| !o.is_empty()) {
                    let field_paths: Vec<String> = fields
                        .as_object()
                        .map(|obj| obj.keys().cloned().collect())
                        .unwrap_or_default();
                    let mut w = json!({
                        "update": {
                            "name": self.doc_name(path),
                            "fields": to_firestore_fields(fields)
                        },
                        "updateMask": { "fieldPaths": field_paths }
                    });
                    if !transforms.is_empty() {
                        let t: Vec<Value> = transforms.iter().map(|t| t.to_json()).collect();
                        w["updateTransforms"] = Value::Array(t);
                    }
                    w
                } else {
                    let t: Vec<Value> = transforms.iter().map(|t| t.to_json()).collect();
                    json!({
                        "transform": {
                            "document": self.doc_name(path),
                            "fieldTransforms": t
                        }
                    })
                }
            }
        }
    }
}

/// Convert Firestore document to regular JSON
fn from_firestore_document(doc: &Value) -> Value {
    if let Some(fields) = doc.get("fields") {
        from_firestore_value(&json!({ "mapValue": { "fields": fields } }))
    } else {
        Value::Null
    }
}

/// Convert Firestore value to regular JSON value
fn from_firestore_value(value: &Value) -> Value {
    if let Some(s) = value.get("stringValue") {
        return s.clone();
    }
    if let Some(n) = value.get("integerValue") {
        if let Some(s) = n.as_str() {
            return Value::Number(s.parse().unwrap_or(0.into()));
        }
        return n.clone();
    }
    if let Some(n) = value.get("doubleValue") {
        return n.clone();
    }
    if let Some(b) = value.get("booleanValue") {
        return b.clone();
    }
    if let Some(ts) = value.get("timestampValue") {
        return ts.clone();
    }
    if value.get("nullValue").is_some() {
        return Value::Null;
    }
    if let Some(arr) = value
        .get("arrayValue")
        .and_then(|a| a.get("values"))
        .and_then(|v| v.as_array())
    {
        return Value::Array(arr.iter().map(from_firestore_value).collect());
    }
    if let Some(obj) = value
        .get("mapValue")
        .and_then(|m| m.get("fields"))
        .and_then(|f| f.as_object())
    {
        let map: serde_json::Map<String, Value> = obj
            .iter()
            .map(|(k, v)| (k.clone(), from_firestore_value(v)))
            .collect();
        return Value::Object(map);
    }
    Value::Null
}

/// Convert regular JSON to Firestore document format
fn to_firestore_document(data: &Value) -> Value {
    json!({
        "fields": to_firestore_fields(data)
    })
}

/// Convert JSON object to Firestore fields
fn to_firestore_fields(data: &Value) -> Value {
    if let Some(obj) = data.as_object() {
        let fields: serde_json::Map<String, Value> = obj
            .iter()
            .map(|(k, v)| (k.clone(), to_firestore_value(v)))
            .collect();
        Value::Object(fields)
    } else {
        json!({})
    }
}

/// Convert JSON value to Firestore value format
fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::String(s) => json!({ "stringValue": s }),
        Value::Number(n) => {
            if n.is_f64() {
                json!({ "doubleValue": n })
            } else {
                json!({ "integerValue": n.to_string() })
            }
        }
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Array(arr) => {
            let values: Vec<Value> = arr.iter().map(to_firestore_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(obj) => {
            let fields: serde_json::Map<String, Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), to_firestore_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
        Value::Null => json!({ "nullValue": null }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_scalars() {
        let data = json!({ "title": "Intro", "uses": 3, "active": true });
        let doc = to_firestore_document(&data);
        assert_eq!(doc["fields"]["uses"]["integerValue"], "3");
        let back = from_firestore_document(&doc);
        assert_eq!(back, data);
    }

    #[test]
    fn test_nested_arrays_and_maps() {
        let data = json!({
            "modules": [
                { "id": "m1", "lessons": [{ "id": "l1" }] }
            ]
        });
        let back = from_firestore_document(&to_firestore_document(&data));
        assert_eq!(back, data);
    }

    #[test]
    fn test_increment_transform_shape() {
        let t = FieldTransform::Increment {
            field: "uses".to_string(),
            by: 1,
        };
        let j = t.to_json();
        assert_eq!(j["fieldPath"], "uses");
        assert_eq!(j["increment"]["integerValue"], "1");
    }
}

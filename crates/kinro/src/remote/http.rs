//! REST backend over `reqwest`.

use log::{debug, trace};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use kinro_core::{
    identifier::Id,
    schema::{Attribute, ClassRecord, Connection, DataRow, Property},
};

use super::{
    AttributePatch, Backend, ClassPatch, DataPatch, NewAttribute, NewClass, NewConnection,
    NewDataRow, NewProperty, PropertyPatch, RemoteError,
};

/// Backend that issues one HTTP request per call against `base_url`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend for the server at `base_url`
    /// (for example `http://127.0.0.1:8000`).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the HTTP client cannot be
    /// initialized.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a backend that reuses an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the server base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, RemoteError>
    where
        B: Serialize + ?Sized,
    {
        debug!(method:% = method, path; "Sending request");

        let mut request = self
            .client
            .request(method.clone(), format!("{}{path}", self.base_url));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        let status = response.status();
        trace!(method:% = method, path, status = status.as_u16(); "Received response");

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                detail: error_detail(status, &body),
            })
        }
    }

    async fn call_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .call(method, path, body)
            .await?
            .bytes()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    async fn call_empty<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), RemoteError>
    where
        B: Serialize + ?Sized,
    {
        self.call(method, path, body).await.map(drop)
    }
}

/// Extracts the user-facing message from an error body.
///
/// The server answers failures with `{"detail": ...}`; a string detail is
/// used as is, any other detail value is rendered as JSON. Bodies without
/// a detail fall back to their text, then to the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|mut value| value.get_mut("detail").map(serde_json::Value::take));
    match detail {
        Some(serde_json::Value::String(text)) => return text,
        Some(other) => return other.to_string(),
        None => {}
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.to_string()
    }
}

const NO_BODY: Option<&()> = None;

impl Backend for HttpBackend {
    async fn fetch_classes(&self) -> Result<Vec<ClassRecord>, RemoteError> {
        self.call_json(Method::GET, "/classes/", NO_BODY).await
    }

    async fn create_class(&self, class: &NewClass) -> Result<ClassRecord, RemoteError> {
        self.call_json(Method::POST, "/classes/", Some(class)).await
    }

    async fn update_class(
        &self,
        id: &Id,
        patch: &ClassPatch,
    ) -> Result<ClassRecord, RemoteError> {
        self.call_json(Method::PATCH, &format!("/classes/{id}"), Some(patch))
            .await
    }

    async fn delete_class(&self, id: &Id) -> Result<(), RemoteError> {
        self.call_empty(Method::DELETE, &format!("/classes/{id}"), NO_BODY)
            .await
    }

    async fn create_attribute(
        &self,
        attribute: &NewAttribute,
    ) -> Result<Attribute, RemoteError> {
        self.call_json(Method::POST, "/attributes/", Some(attribute))
            .await
    }

    async fn update_attribute(
        &self,
        id: &Id,
        patch: &AttributePatch,
    ) -> Result<Attribute, RemoteError> {
        self.call_json(Method::PATCH, &format!("/attributes/{id}"), Some(patch))
            .await
    }

    async fn delete_attribute(&self, id: &Id) -> Result<(), RemoteError> {
        self.call_empty(Method::DELETE, &format!("/attributes/{id}"), NO_BODY)
            .await
    }

    async fn create_property(&self, property: &NewProperty) -> Result<Property, RemoteError> {
        self.call_json(Method::POST, "/properties/", Some(property))
            .await
    }

    async fn update_property(
        &self,
        id: &Id,
        patch: &PropertyPatch,
    ) -> Result<Property, RemoteError> {
        self.call_json(Method::PATCH, &format!("/properties/{id}"), Some(patch))
            .await
    }

    async fn delete_property(&self, id: &Id) -> Result<(), RemoteError> {
        self.call_empty(Method::DELETE, &format!("/properties/{id}"), NO_BODY)
            .await
    }

    async fn fetch_connections(&self) -> Result<Vec<Connection>, RemoteError> {
        self.call_json(Method::GET, "/connections/", NO_BODY).await
    }

    async fn create_connection(
        &self,
        connection: &NewConnection,
    ) -> Result<Connection, RemoteError> {
        self.call_json(Method::POST, "/connections/", Some(connection))
            .await
    }

    async fn delete_connection(&self, id: &Id) -> Result<(), RemoteError> {
        self.call_empty(Method::DELETE, &format!("/connections/{id}"), NO_BODY)
            .await
    }

    async fn fetch_class_data(&self, class_id: &Id) -> Result<Vec<DataRow>, RemoteError> {
        self.call_json(Method::GET, &format!("/data/{class_id}/data/"), NO_BODY)
            .await
    }

    async fn create_data_batch(&self, rows: &[NewDataRow]) -> Result<(), RemoteError> {
        self.call_empty(Method::POST, "/data/batch", Some(rows)).await
    }

    async fn update_data(&self, id: &Id, patch: &DataPatch) -> Result<DataRow, RemoteError> {
        self.call_json(Method::PATCH, &format!("/data/{id}"), Some(patch))
            .await
    }

    async fn delete_data(&self, id: &Id) -> Result<(), RemoteError> {
        self.call_empty(Method::DELETE, &format!("/data/{id}"), NO_BODY)
            .await
    }

    async fn delete_data_batch(&self, ids: &[Id]) -> Result<(), RemoteError> {
        self.call_empty(Method::DELETE, "/data/batch", Some(ids)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        let detail = error_detail(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Class not found"}"#,
        );
        assert_eq!(detail, "Class not found");
    }

    #[test]
    fn test_structured_detail_is_rendered_as_json() {
        let detail = error_detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "name"]}]}"#,
        );
        assert_eq!(detail, r#"[{"loc":["body","name"]}]"#);
    }

    #[test]
    fn test_missing_detail_falls_back() {
        assert_eq!(
            error_detail(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::with_client(Client::new(), "http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }
}

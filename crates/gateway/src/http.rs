//! REST implementation of [`EntityGateway`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use bankconsole_accounts::{Account, Transaction};

use crate::capability::{Capability, EntityKind, GatewayCapabilities, Operation};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::EntityGateway;
use crate::record::{Draft, Record};

/// reqwest-backed client for the banking REST API.
///
/// Both fetch-all aliases map to `GET /<collection>`; both update aliases
/// map to `PUT /<collection>/{id}`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    capabilities: GatewayCapabilities,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            capabilities: GatewayCapabilities::all(),
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(base_url)
        }
    }

    /// Restrict the advertised surface (deployments lacking some aliases).
    pub fn with_capabilities(mut self, capabilities: GatewayCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /out-standing?userId=`
    pub async fn outstanding_balance(&self, user_id: &str) -> GatewayResult<Decimal> {
        #[derive(Deserialize)]
        struct Amount(#[serde(with = "rust_decimal::serde::float")] Decimal);

        let req = self
            .request(Method::GET, "/out-standing")
            .query(&[("userId", user_id)]);
        let body = self.send(req).await?;
        let Amount(value) = serde_json::from_slice(&body)?;
        Ok(value)
    }

    /// `GET /accounts/user/{userId}`
    pub async fn accounts_by_user(&self, user_id: &str) -> GatewayResult<Vec<Account>> {
        let req = self.request(Method::GET, &format!("/accounts/user/{user_id}"));
        let body = self.send(req).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /transactions/customer/{userId}`
    pub async fn transactions_by_customer(&self, user_id: &str) -> GatewayResult<Vec<Transaction>> {
        let req = self.request(Method::GET, &format!("/transactions/customer/{user_id}"));
        let body = self.send(req).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn ensure(&self, entity: EntityKind, operation: Operation) -> GatewayResult<()> {
        if self.capabilities.supports(entity, operation) {
            Ok(())
        } else {
            Err(GatewayError::CapabilityAbsent(Capability::new(entity, operation)))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send and return the raw body of a 2xx response.
    async fn send(&self, req: RequestBuilder) -> GatewayResult<Vec<u8>> {
        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api(status.as_u16(), text));
        }

        Ok(resp.bytes().await?.to_vec())
    }

    async fn list(&self, entity: EntityKind) -> GatewayResult<Vec<Record>> {
        let req = self.request(Method::GET, &format!("/{}", entity.collection()));
        let body = self.send(req).await?;
        Record::list_from_json(entity, &body)
    }

    async fn put(&self, entity: EntityKind, id: i64, body: &impl serde::Serialize) -> GatewayResult<Record> {
        let req = self
            .request(Method::PUT, &format!("/{}/{}", entity.collection(), id))
            .json(body);
        let body = self.send(req).await?;
        Record::from_json(entity, &body)
    }
}

#[async_trait]
impl EntityGateway for HttpGateway {
    fn capabilities(&self) -> &GatewayCapabilities {
        &self.capabilities
    }

    async fn create(&self, draft: Draft) -> GatewayResult<Record> {
        let entity = draft.kind();
        self.ensure(entity, Operation::Create)?;
        tracing::debug!(%entity, "POST create");

        let req = self
            .request(Method::POST, &format!("/{}", entity.collection()))
            .json(&draft);
        let body = self.send(req).await?;
        Record::from_json(entity, &body)
    }

    async fn fetch_all(&self, entity: EntityKind) -> GatewayResult<Vec<Record>> {
        self.ensure(entity, Operation::FetchAll)?;
        self.list(entity).await
    }

    async fn fetch_all_alias(&self, entity: EntityKind) -> GatewayResult<Vec<Record>> {
        self.ensure(entity, Operation::FetchAllAlias)?;
        self.list(entity).await
    }

    async fn fetch_by_id(&self, entity: EntityKind, id: i64) -> GatewayResult<Option<Record>> {
        self.ensure(entity, Operation::FetchById)?;
        tracing::debug!(%entity, id, "GET by id");

        let req = self.request(Method::GET, &format!("/{}/{}", entity.collection(), id));
        match self.send(req).await {
            Ok(body) => Record::from_json(entity, &body).map(Some),
            Err(GatewayError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_partial(&self, id: i64, changes: Draft) -> GatewayResult<Record> {
        let entity = changes.kind();
        self.ensure(entity, Operation::UpdatePartial)?;
        tracing::debug!(%entity, id, "PUT partial update");
        self.put(entity, id, &changes).await
    }

    async fn update_full(&self, record: Record) -> GatewayResult<Record> {
        let entity = record.kind();
        self.ensure(entity, Operation::UpdateFull)?;
        let id = record.id().ok_or_else(|| {
            GatewayError::InvalidRequest(format!("{entity} record has no id for a full update"))
        })?;
        tracing::debug!(%entity, id, "PUT full update");
        self.put(entity, id, &record).await
    }

    async fn delete(&self, entity: EntityKind, id: i64) -> GatewayResult<()> {
        self.ensure(entity, Operation::Delete)?;
        tracing::debug!(%entity, id, "DELETE");

        let req = self.request(Method::DELETE, &format!("/{}/{}", entity.collection(), id));
        self.send(req).await.map(|_| ())
    }
}

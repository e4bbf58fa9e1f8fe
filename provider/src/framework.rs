//! Resource and data-source contracts.
//!
//! # Design
//! Adapters implement the typed [`Resource`] / [`DataSource`] traits against
//! their own state model. The registry stores them behind the type-erased
//! [`ResourceHandler`] / [`DataSourceHandler`] traits, which speak
//! `serde_json::Value` the way the host does. Erasure decodes the host
//! document, runs the typed operation inside a tracing span, and encodes the
//! resulting state.
//!
//! State semantics:
//! - `create` / `update` return the new state, or `None` to leave the host
//!   state untouched (always paired with an error diagnostic).
//! - `read` returns `None` only when the object is gone (drift). Any failure,
//!   including a prior state document that does not decode, returns the prior
//!   state unchanged alongside the error.

use archestra_client::ArchestraClient;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::diag::{Diagnostic, Diagnostics};
use crate::schema::{PlannedChange, Schema};

/// Everything an operation needs from the configured provider.
#[derive(Debug, Clone, Copy)]
pub struct OperationContext<'a> {
    pub client: &'a ArchestraClient,
    pub scope: &'a CancellationToken,
}

#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, ctx: OperationContext<'_>, plan: Self::Model, diags: &mut Diagnostics) -> Option<Self::Model>;

    async fn read(&self, ctx: OperationContext<'_>, state: Self::Model, diags: &mut Diagnostics) -> Option<Self::Model>;

    async fn update(
        &self,
        ctx: OperationContext<'_>,
        plan: Self::Model,
        state: Self::Model,
        diags: &mut Diagnostics,
    ) -> Option<Self::Model>;

    async fn delete(&self, ctx: OperationContext<'_>, state: Self::Model, diags: &mut Diagnostics);

    /// Seed state from an import id. The default maps it to `{ "id": ... }`
    /// with every other attribute null; the following read fills the rest.
    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<Self::Model> {
        match serde_json::from_value(serde_json::json!({ "id": id })) {
            Ok(model) => Some(model),
            Err(e) => {
                diags.push(Diagnostic::error("Import Failed", format!("Unable to import '{id}': {e}")));
                None
            }
        }
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, ctx: OperationContext<'_>, config: Self::Model, diags: &mut Diagnostics) -> Option<Self::Model>;
}

/// State document plus the diagnostics produced while computing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateResult {
    pub state: Option<serde_json::Value>,
    pub diagnostics: Diagnostics,
}

impl StateResult {
    fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    /// Hand `prior` back untouched.
    pub(crate) fn kept(prior: serde_json::Value, diagnostics: Diagnostics) -> Self {
        Self {
            state: Some(prior),
            diagnostics,
        }
    }
}

#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> Schema;

    fn plan(&self, prior: Option<&serde_json::Value>, config: &serde_json::Value) -> (PlannedChange, Diagnostics) {
        let schema = self.schema();
        let diags = schema.validate_config(config);
        (schema.plan(prior, config), diags)
    }

    async fn create(&self, ctx: OperationContext<'_>, plan: serde_json::Value) -> StateResult;
    async fn read(&self, ctx: OperationContext<'_>, state: serde_json::Value) -> StateResult;
    async fn update(&self, ctx: OperationContext<'_>, plan: serde_json::Value, state: serde_json::Value) -> StateResult;
    async fn delete(&self, ctx: OperationContext<'_>, state: serde_json::Value) -> Diagnostics;
    fn import(&self, id: &str) -> StateResult;
}

#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> Schema;
    async fn read(&self, ctx: OperationContext<'_>, config: serde_json::Value) -> StateResult;
}

/// Adapts a typed [`Resource`] to [`ResourceHandler`].
pub struct ErasedResource<R>(pub R);

/// Adapts a typed [`DataSource`] to [`DataSourceHandler`].
pub struct ErasedDataSource<D>(pub D);

fn decode<M: DeserializeOwned>(what: &str, document: serde_json::Value, diags: &mut Diagnostics) -> Option<M> {
    match serde_json::from_value(document) {
        Ok(model) => Some(model),
        Err(e) => {
            diags.push(Diagnostic::error("Invalid Document", format!("Unable to decode {what}: {e}")));
            None
        }
    }
}

fn encode<M: Serialize>(model: Option<M>, mut diags: Diagnostics) -> StateResult {
    let Some(model) = model else {
        return StateResult::failed(diags);
    };
    match serde_json::to_value(&model) {
        Ok(state) => StateResult {
            state: Some(state),
            diagnostics: diags,
        },
        Err(e) => {
            diags.push(Diagnostic::error("Invalid State", format!("Unable to encode state: {e}")));
            StateResult::failed(diags)
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceHandler for ErasedResource<R> {
    fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    fn schema(&self) -> Schema {
        self.0.schema()
    }

    async fn create(&self, ctx: OperationContext<'_>, plan: serde_json::Value) -> StateResult {
        let span = tracing::info_span!("create", resource = self.0.type_name());
        async move {
            let mut diags = Diagnostics::new();
            let Some(plan) = decode::<R::Model>("plan", plan, &mut diags) else {
                return StateResult::failed(diags);
            };
            let state = self.0.create(ctx, plan, &mut diags).await;
            encode(state, diags)
        }
        .instrument(span)
        .await
    }

    async fn read(&self, ctx: OperationContext<'_>, state: serde_json::Value) -> StateResult {
        let span = tracing::info_span!("read", resource = self.0.type_name());
        async move {
            let mut diags = Diagnostics::new();
            let Some(state) = decode::<R::Model>("state", state.clone(), &mut diags) else {
                return StateResult::kept(state, diags);
            };
            let state = self.0.read(ctx, state, &mut diags).await;
            encode(state, diags)
        }
        .instrument(span)
        .await
    }

    async fn update(&self, ctx: OperationContext<'_>, plan: serde_json::Value, state: serde_json::Value) -> StateResult {
        let span = tracing::info_span!("update", resource = self.0.type_name());
        async move {
            let mut diags = Diagnostics::new();
            let plan = decode::<R::Model>("plan", plan, &mut diags);
            let state = decode::<R::Model>("state", state, &mut diags);
            let (Some(plan), Some(state)) = (plan, state) else {
                return StateResult::failed(diags);
            };
            let state = self.0.update(ctx, plan, state, &mut diags).await;
            encode(state, diags)
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: serde_json::Value) -> Diagnostics {
        let span = tracing::info_span!("delete", resource = self.0.type_name());
        async move {
            let mut diags = Diagnostics::new();
            if let Some(state) = decode::<R::Model>("state", state, &mut diags) {
                self.0.delete(ctx, state, &mut diags).await;
            }
            diags
        }
        .instrument(span)
        .await
    }

    fn import(&self, id: &str) -> StateResult {
        let mut diags = Diagnostics::new();
        let state = self.0.import(id, &mut diags);
        encode(state, diags)
    }
}

#[async_trait]
impl<D: DataSource> DataSourceHandler for ErasedDataSource<D> {
    fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    fn schema(&self) -> Schema {
        self.0.schema()
    }

    async fn read(&self, ctx: OperationContext<'_>, config: serde_json::Value) -> StateResult {
        let span = tracing::info_span!("read", data_source = self.0.type_name());
        async move {
            let mut diags = Diagnostics::new();
            let Some(config) = decode::<D::Model>("config", config, &mut diags) else {
                return StateResult::failed(diags);
            };
            let state = self.0.read(ctx, config, &mut diags).await;
            encode(state, diags)
        }
        .instrument(span)
        .await
    }
}

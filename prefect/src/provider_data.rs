//! Provider data structure passed to resources and data sources

use std::any::Any;
use std::sync::Arc;
use tfplug::types::Diagnostic;

use crate::api::Client;

#[derive(Clone)]
pub struct PrefectProviderData {
    pub client: Client,
}

impl PrefectProviderData {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Downcasts the opaque data handed to `configure`
    pub fn from_any(provider_data: Option<Arc<dyn Any + Send + Sync>>) -> Result<Self, Diagnostic> {
        let data = provider_data.ok_or_else(|| {
            Diagnostic::error(
                "No provider data",
                "No provider data was provided; the provider must be configured first",
            )
        })?;

        data.downcast_ref::<PrefectProviderData>()
            .cloned()
            .ok_or_else(|| {
                Diagnostic::error(
                    "Unexpected Configure Type",
                    "Expected PrefectProviderData. Please report this issue to the provider developers.",
                )
            })
    }
}

pub mod accounts;
pub mod client;
pub mod deployments;
pub mod error;
pub mod flows;
pub mod work_pools;
pub mod workspaces;

pub use client::{default_headers, normalize_endpoint, Client, PREFECT_CLOUD_HOST};
pub use error::ApiError;

use serde::{Deserialize, Deserializer};

/// The API sends `null` for unset collections and strings; treat it as empty
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

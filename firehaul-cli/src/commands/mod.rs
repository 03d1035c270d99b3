pub mod collections;
pub mod export;

use anyhow::{bail, Result};
use firehaul::store::RestStore;

/// Build a store client from CLI credentials. The emulator wins when both
/// are configured, matching the upstream client libraries.
pub fn connect(
    project: &str,
    access_token: Option<String>,
    emulator_host: Option<String>,
) -> Result<RestStore> {
    let store = match (emulator_host, access_token) {
        (Some(host), _) => RestStore::emulator(&host, project)?,
        (None, Some(token)) => RestStore::new(project, token)?,
        (None, None) => bail!(
            "no credentials: pass --access-token (or set GOOGLE_ACCESS_TOKEN), \
             or point FIRESTORE_EMULATOR_HOST at an emulator"
        ),
    };
    Ok(store)
}

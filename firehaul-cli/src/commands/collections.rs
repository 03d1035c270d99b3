//! Root collection listing (diagnostic).

use anyhow::Result;
use firehaul::store::DocumentStore;

pub async fn run(
    project: String,
    access_token: Option<String>,
    emulator_host: Option<String>,
) -> Result<()> {
    let store = super::connect(&project, access_token, emulator_host)?;
    let roots = store.list_collections(None).await?;

    if roots.is_empty() {
        eprintln!("(no root collections)");
        return Ok(());
    }
    for collection in &roots {
        println!("{}", collection.id);
    }
    Ok(())
}

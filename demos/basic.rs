use quip_http::QuipClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let quip = QuipClient::from_env().map_err(anyhow::Error::msg)?;

    if !quip.check_user().await? {
        anyhow::bail!("QUIP_TOKEN was rejected by {}", quip.api_url());
    }

    let Some(user) = quip.get_current_user().await else {
        anyhow::bail!("could not fetch the current user");
    };
    println!("{}", serde_json::to_string_pretty(&user)?);

    let folder_ids = ["private_folder_id", "starred_folder_id", "desktop_folder_id"]
        .into_iter()
        .filter_map(|key| user[key].as_str())
        .collect::<Vec<_>>();
    if let Some(folders) = quip.get_folders(&folder_ids).await {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    }

    println!("{}", serde_json::to_string_pretty(&quip.stats())?);
    Ok(())
}

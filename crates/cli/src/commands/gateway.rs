//! `baton gateway` — start the HTTP JSON API.

pub async fn run(port: Option<u16>) -> anyhow::Result<()> {
    let (config, manager) = super::build_runtime()?;
    let port = port.unwrap_or(config.gateway.port);

    baton_gateway::serve(manager, &config.gateway.host, port).await?;
    Ok(())
}

//! `persona serve`: Start the HTTP chat API.

use persona_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("persona gateway");
    println!("   Listening:   {}:{}", config.gateway.host, config.gateway.port);
    println!("   Environment: {}", config.gateway.environment);
    println!("   Sessions:    {}", config.session.backend);
    println!("   Vectors:     {}", config.vector_store.backend);

    persona_gateway::start(config).await?;

    Ok(())
}

//! `persona ask`: Run one message through the chat pipeline.
//!
//! Uses the configured backends, so a persistent session backend lets
//! successive invocations share context via `--session`.

use persona_config::AppConfig;
use persona_core::session::SessionId;

pub async fn run(
    message: String,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set GOOGLE_API_KEY, or add api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let orchestrator = persona_gateway::build_orchestrator(&config).await?;
    let session = session
        .as_deref()
        .map(SessionId::from)
        .unwrap_or_default();

    let outcome = orchestrator.respond(&message, &session).await?;

    println!("{}", outcome.response);
    eprintln!();
    eprintln!(
        "  [{} | {} document(s) | session {}]",
        outcome.intent, outcome.documents, session
    );

    Ok(())
}

//! `persona config`: Configuration management commands.

use clap::Subcommand;
use persona_config::AppConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file location
    Path,
    /// Print a config file with every default filled in
    Default,
    /// Load and validate the configuration
    Validate,
}

pub async fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::Path => {
            println!("{}", config_path().display());
            Ok(())
        }
        ConfigAction::Default => {
            println!("{}", AppConfig::default_toml());
            Ok(())
        }
        ConfigAction::Validate => validate(),
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::var("PERSONA_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| AppConfig::config_dir().join("config.toml"))
}

fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{config:#?}");
    Ok(())
}

fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set GOOGLE_API_KEY)".to_string());
    }
    if config.vector_store.backend == "mongodb" {
        if let Err(e) = config.mongo.connection_uri() {
            warnings.push(format!("MongoDB connection incomplete: {e}"));
        }
        if config.mongo.collection.is_none() {
            warnings.push("No MongoDB collection set (set MONGO_CL_NAME)".to_string());
        }
    }
    if config.gateway.allowed_origins().is_empty() {
        warnings.push("No CORS origins (set DEVELOPMENT_URL / PRODUCTION_URL)".to_string());
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Model:     {}", config.model.chat_model);
    println!("   Embedding: {}", config.model.embedding_model);
    println!("   Owner:     {}", config.persona.owner_name);
    println!("   Sessions:  {}", config.session.backend);
    println!("   Vectors:   {}", config.vector_store.backend);
    println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);

    Ok(())
}

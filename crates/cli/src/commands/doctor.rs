//! `persona doctor`: Diagnose configuration and credentials.

use persona_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("persona doctor; system diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration loaded");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  1 issue found. Fix the configuration first.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ Gemini API key configured");
        let provider = persona_providers::build_from_config(&config);
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Gemini API reachable"),
            Ok(false) => {
                println!("  ❌ Gemini API rejected the model listing; check the key");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Gemini API unreachable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ No Gemini API key; set GOOGLE_API_KEY");
        issues += 1;
    }

    match config.vector_store.backend.as_str() {
        "mongodb" => match config.mongo.connection_uri() {
            Ok(_) if config.mongo.collection.is_some() => {
                println!("  ✅ MongoDB connection configured");
            }
            Ok(_) => {
                println!("  ❌ MongoDB collection missing; set MONGO_CL_NAME");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ MongoDB connection incomplete: {e}");
                issues += 1;
            }
        },
        _ => match &config.vector_store.seed_path {
            Some(path) if std::path::Path::new(path).exists() => {
                println!("  ✅ Vector seed file present");
            }
            Some(path) => {
                println!("  ❌ Vector seed file missing: {path}");
                issues += 1;
            }
            None => {
                println!("  ⚠️  In-memory vector store without seed file; retrieval finds nothing");
                issues += 1;
            }
        },
    }

    match config.session.backend.as_str() {
        "memory" => println!("  ✅ Sessions kept in memory (lost on restart)"),
        other => {
            let dir = AppConfig::config_dir();
            if dir.exists() || config.session.path.is_some() {
                println!("  ✅ Sessions persisted with the {other} backend");
            } else {
                println!("  ⚠️  {} does not exist yet; it will be created", dir.display());
            }
        }
    }

    if config.gateway.allowed_origins().is_empty() {
        println!("  ⚠️  No CORS origins; set DEVELOPMENT_URL / PRODUCTION_URL");
        issues += 1;
    } else {
        println!("  ✅ CORS origins: {}", config.gateway.allowed_origins().join(", "));
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

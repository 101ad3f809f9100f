//! `agentloom doctor`: diagnose config and backend health.

use std::path::Path;

use agentloom_core::model::ModelClient;
use agentloom_providers::OllamaClient;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 AgentLoom Doctor: System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running agents.");
            return Ok(());
        }
    };

    let client = OllamaClient::from_config(&config.ollama)?;
    if client.health_check().await {
        println!("  ✅ Ollama reachable at {}", client.base_url());

        match client.list_models().await {
            Ok(models) => {
                println!("  ✅ {} model(s) installed", models.len());
                if has_model(&models, &config.ollama.model) {
                    println!("  ✅ Model '{}' available", config.ollama.model);
                } else {
                    println!(
                        "  ❌ Model '{}' not installed: run `ollama pull {}`",
                        config.ollama.model, config.ollama.model
                    );
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  ⚠️  Could not list models: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ Ollama not reachable at {}", client.base_url());
        issues += 1;
    }

    if config.data.path.is_dir() {
        println!("  ✅ Data directory {}", config.data.path.display());
    } else {
        println!(
            "  ⚠️  Data directory {} missing (created on first save_log)",
            config.data.path.display()
        );
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Ollama reports untagged models as `<name>:latest`.
fn has_model(installed: &[String], model: &str) -> bool {
    installed
        .iter()
        .any(|m| m == model || m.strip_suffix(":latest") == Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_match_accepts_latest_tag() {
        let installed = vec!["phi3:latest".to_string(), "llama3:8b".to_string()];
        assert!(has_model(&installed, "phi3"));
        assert!(has_model(&installed, "phi3:latest"));
        assert!(has_model(&installed, "llama3:8b"));
        assert!(!has_model(&installed, "llama3"));
        assert!(!has_model(&[], "phi3"));
    }
}

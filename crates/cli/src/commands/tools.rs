//! `agentloom tools`: list the built-in tools.

use agentloom_config::AppConfig;

pub fn run(config: &AppConfig, schemas: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = agentloom_tools::default_registry(config);

    if schemas {
        let schemas = registry.call_schemas(None);
        println!("{}", serde_json::to_string_pretty(&schemas)?);
    } else {
        println!("{} tools registered\n", registry.len());
        println!("{}", registry.describe_for_prompt(None));
    }

    Ok(())
}

use log::{debug, error};
use recipe_extract::{fetch_recipe_with, AppConfig, ImportError};
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    // Get the URL from command-line arguments
    let Some(url) = env::args().nth(1) else {
        eprintln!("Usage: recipe-extract <url>");
        return ExitCode::from(2);
    };

    match run(&url).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to extract a recipe from {}: {}", url, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(url: &str) -> Result<String, ImportError> {
    let config = AppConfig::load()?;
    debug!("Loaded configuration: {:?}", config);

    let recipe = fetch_recipe_with(&config, url).await?;
    Ok(serde_json::to_string_pretty(&recipe)?)
}

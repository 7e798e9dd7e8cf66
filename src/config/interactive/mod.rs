#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, EncoderConfig, EncoderProvider, LlmConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🌊 NeptuneAI Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Encoder").bold().yellow());
    eprintln!("Choose how query and profile text is turned into vectors.");
    eprintln!();

    configure_encoder(&mut config.encoder)?;

    eprintln!();
    eprintln!("{}", style("Language Model").bold().yellow());
    eprintln!("The chat pipeline falls back to a templated answer when this endpoint is unreachable.");
    eprintln!();

    configure_llm(&mut config.llm)?;

    if config.encoder.provider == EncoderProvider::Remote {
        eprintln!();
        eprintln!("{}", style("Testing embedding server...").yellow());

        if test_encoder_connection(&config.encoder)? {
            eprintln!("{}", style("✓ Embedding server reachable!").green());
        } else {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not reach the embedding server").yellow()
            );
            eprintln!("You can continue, but make sure it is running before ingesting data.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Encoder Settings:").bold().yellow());
    eprintln!(
        "  Provider: {}",
        style(match config.encoder.provider {
            EncoderProvider::Hashing => "hashing (local)",
            EncoderProvider::Remote => "remote",
        })
        .cyan()
    );
    eprintln!("  Model: {}", style(&config.encoder.model).cyan());
    eprintln!("  Dimension: {}", style(config.encoder.dimension).cyan());
    if config.encoder.provider == EncoderProvider::Remote {
        match config.encoder.endpoint_url() {
            Ok(url) => eprintln!("  Server URL: {}", style(url).cyan()),
            Err(e) => eprintln!("  Server URL: {} ({})", style("Invalid").red(), e),
        }
        eprintln!("  Batch Size: {}", style(config.encoder.batch_size).cyan());
    }

    eprintln!();
    eprintln!("{}", style("Language Model Settings:").bold().yellow());
    eprintln!("  API URL: {}", style(&config.llm.api_url).cyan());
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    eprintln!("  API Key Env: {}", style(&config.llm.api_key_env).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(config.llm.timeout_seconds).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let config = Config {
                base_dir: Config::config_dir()?,
                ..Config::default()
            };
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_encoder(encoder: &mut EncoderConfig) -> Result<()> {
    let providers = &["hashing (local, deterministic)", "remote (embedding server)"];
    let default_index = match encoder.provider {
        EncoderProvider::Hashing => 0,
        EncoderProvider::Remote => 1,
    };

    let provider_index = Select::new()
        .with_prompt("Embedding provider")
        .default(default_index)
        .items(providers)
        .interact()?;

    encoder.provider = if provider_index == 0 {
        EncoderProvider::Hashing
    } else {
        EncoderProvider::Remote
    };

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(encoder.dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;
    encoder.dimension = dimension;

    if encoder.provider == EncoderProvider::Remote {
        let protocols = &["http", "https"];
        let default_protocol = protocols
            .iter()
            .position(|&p| p == encoder.protocol)
            .unwrap_or(0);

        let protocol_index = Select::new()
            .with_prompt("Embedding server protocol")
            .default(default_protocol)
            .items(protocols)
            .interact()?;
        encoder.protocol = protocols[protocol_index].to_string();

        encoder.host = Input::new()
            .with_prompt("Embedding server host")
            .default(encoder.host.clone())
            .interact_text()?;

        encoder.port = Input::new()
            .with_prompt("Embedding server port")
            .default(encoder.port)
            .validate_with(|input: &u16| -> Result<(), &str> {
                if *input == 0 {
                    Err("Port must be greater than 0")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;

        encoder.model = Input::new()
            .with_prompt("Embedding model")
            .default(encoder.model.clone())
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.trim().is_empty() {
                    Err("Model name cannot be empty")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;

        encoder.batch_size = Input::new()
            .with_prompt("Batch size for embedding generation")
            .default(encoder.batch_size)
            .validate_with(|input: &u32| -> Result<(), &str> {
                if *input == 0 {
                    Err("Batch size must be greater than 0")
                } else if *input > 1000 {
                    Err("Batch size must be 1000 or less")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
    }

    encoder.validate()?;
    Ok(())
}

fn configure_llm(llm: &mut LlmConfig) -> Result<()> {
    llm.api_url = Input::new()
        .with_prompt("Chat completions API URL")
        .default(llm.api_url.clone())
        .interact_text()?;

    llm.model = Input::new()
        .with_prompt("Chat model")
        .default(llm.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    llm.api_key_env = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(llm.api_key_env.clone())
        .interact_text()?;

    llm.timeout_seconds = Input::new()
        .with_prompt("Request timeout in seconds")
        .default(llm.timeout_seconds)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if (1..=300).contains(input) {
                Ok(())
            } else {
                Err("Timeout must be between 1 and 300 seconds")
            }
        })
        .interact_text()?;

    llm.validate()?;
    Ok(())
}

fn test_encoder_connection(encoder: &EncoderConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/api/version",
        encoder.protocol, encoder.host, encoder.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}

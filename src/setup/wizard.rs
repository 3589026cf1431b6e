//! First-run interactive setup wizard.
//!
//! Steps:
//! 1. Display banner
//! 2. Collect model endpoint, key and model name
//! 3. Collect the AMap key
//! 4. Write agent.toml

use crate::config::{self, AgentConfig};
use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// ASCII banner displayed during setup.
const BANNER: &str = r#"
  _              _                        _
 | |_ ___   ___ | |   __ _  __ _  ___ _ _| |_
 | __/ _ \ / _ \| |  / _` |/ _` |/ -_) ' \  _|
  \__\___/ \___/|_|  \__,_|\__, |\___|_||_\__|
                           |___/
"#;

/// Run the interactive setup wizard on stdin/stdout.
pub fn run_setup_wizard(home_dir: &Path) -> Result<AgentConfig> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_wizard(home_dir, &mut reader, &mut writer)
}

fn run_wizard(home_dir: &Path, reader: &mut impl BufRead, out: &mut impl Write) -> Result<AgentConfig> {
    writeln!(out, "{}", BANNER)?;
    writeln!(out, "Welcome to tool-agent setup.\n")?;

    let config_path = home_dir.join(config::CONFIG_FILE);
    let current = config::load_config(&config_path)?;

    // Step 1: Model
    writeln!(out, "[1/3] Model endpoint")?;
    let model_api_url =
        prompt_with_default(reader, out, "  OpenAI-compatible base URL", &current.model_api_url)?;
    let model = prompt_with_default(reader, out, "  Model name", &current.model)?;
    let model_api_key = prompt(reader, out, "  API key (Enter to skip)")?;

    // Step 2: AMap
    writeln!(out, "\n[2/3] AMap weather service")?;
    let amap_key = prompt(reader, out, "  AMap web-service key")?;

    // Step 3: Write config
    writeln!(out, "\n[3/3] Writing configuration...")?;
    let config = AgentConfig {
        model_api_url,
        model,
        model_api_key: if model_api_key.is_empty() {
            current.model_api_key.clone()
        } else {
            model_api_key
        },
        amap_key: if amap_key.is_empty() {
            current.amap_key.clone()
        } else {
            amap_key
        },
        ..current
    };

    config::save_config(&config, &config_path)?;
    writeln!(out, "  Written: {}", config_path.display())?;
    writeln!(out, "\nSetup complete! Run `tool-agent chat` to start.\n")?;

    Ok(config)
}

/// Prompt the user for input with a label.
fn prompt(reader: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<String> {
    write!(out, "{}: ", label)?;
    out.flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt with a default value.
fn prompt_with_default(
    reader: &mut impl BufRead,
    out: &mut impl Write,
    label: &str,
    default: &str,
) -> Result<String> {
    write!(out, "{} [{}]: ", label, default)?;
    out.flush()?;
    let mut input = String::new();
    reader.read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

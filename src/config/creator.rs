use crate::config::strategy::GridConfiguration;
use crate::constants::MAX_SLOTS;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::fs;

pub fn create_config() -> Result<()> {
    let theme = ColorfulTheme::default();

    let config = prompt_grid_configuration(&theme)?;
    config.validate()?;

    let default_filename = generate_default_filename(&config);

    let filename: String = Input::with_theme(&theme)
        .with_prompt("Configuration filename")
        .default(default_filename)
        .interact_text()?;

    let toml_string = toml::to_string_pretty(&config)?;

    let path = if filename.ends_with(".toml") {
        filename
    } else {
        format!("{}.toml", filename)
    };

    // Bare filenames go to configs/ when that directory exists
    let final_path = if !path.contains('/') && fs::metadata("configs").is_ok() {
        format!("configs/{}", path)
    } else {
        path
    };

    fs::write(&final_path, toml_string)?;
    println!("Configuration saved to {}", final_path);

    Ok(())
}

fn prompt_grid_configuration(theme: &ColorfulTheme) -> Result<GridConfiguration> {
    let symbol: String = Input::with_theme(theme)
        .with_prompt("Symbol (e.g., HYPE/USDC or BTC)")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Symbol must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let slot_count: u32 = Input::with_theme(theme)
        .with_prompt(format!("Total Slots (max {})", MAX_SLOTS))
        .default(10)
        .validate_with(|input: &u32| -> Result<(), String> {
            if (1..=MAX_SLOTS).contains(input) {
                Ok(())
            } else {
                Err(format!("Slot count must be between 1 and {}", MAX_SLOTS))
            }
        })
        .interact_text()?;

    let investment_per_slot: f64 = Input::with_theme(theme)
        .with_prompt("Investment per Slot (quote)")
        .validate_with(positive)
        .interact_text()?;

    let start_price: f64 = Input::with_theme(theme)
        .with_prompt("Start Price (slot 1 buy target)")
        .validate_with(positive)
        .interact_text()?;

    let gap_pct: f64 = Input::with_theme(theme)
        .with_prompt("Gap % (drop to buy)")
        .default(1.0)
        .validate_with(|input: &f64| -> Result<(), &str> {
            if *input > 0.0 && *input < 100.0 {
                Ok(())
            } else {
                Err("Gap must be between 0 and 100 percent")
            }
        })
        .interact_text()?;

    let target_return_pct: f64 = Input::with_theme(theme)
        .with_prompt("Target Return % (rise to sell)")
        .default(1.0)
        .validate_with(positive)
        .interact_text()?;

    let dry_run = Confirm::with_theme(theme)
        .with_prompt("Dry Run (simulation mode)?")
        .default(true)
        .interact()?;

    Ok(GridConfiguration {
        symbol: symbol.trim().to_string(),
        slot_count,
        investment_per_slot,
        start_price,
        gap_fraction: gap_pct / 100.0,
        target_return: target_return_pct / 100.0,
        dry_run,
    })
}

fn positive(input: &f64) -> Result<(), &'static str> {
    if *input > 0.0 {
        Ok(())
    } else {
        Err("Value must be positive")
    }
}

fn generate_default_filename(config: &GridConfiguration) -> String {
    // "HYPE" from "HYPE/USDC"
    let asset = config
        .symbol
        .split('/')
        .next()
        .unwrap_or(&config.symbol);
    format!(
        "{}_BitSplit_{}x{}_{}.toml",
        asset,
        config.slot_count,
        config.start_price,
        if config.dry_run { "dry" } else { "live" }
    )
}

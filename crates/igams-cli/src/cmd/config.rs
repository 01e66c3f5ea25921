use crate::context::Context;
use crate::output::print_json;
use clap::Subcommand;
use igams_core::config::{Config, WarnLevel};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a default config file if none exists
    Init,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Context, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx, json),
        ConfigSubcommand::Validate => validate(ctx, json),
        ConfigSubcommand::Init => init(ctx, json),
    }
}

fn show(ctx: &Context, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&ctx.config);
    }
    println!("# {}", ctx.config_path.display());
    print!("{}", serde_yaml::to_string(&ctx.config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let warnings = ctx.config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let data = serde_yaml::to_string(&Config::default())?;
    let created = igams_core::io::write_if_missing(&ctx.config_path, data.as_bytes())?;

    if json {
        return print_json(&serde_json::json!({
            "path": ctx.config_path,
            "created": created,
        }));
    }
    if created {
        println!("Wrote default config to {}", ctx.config_path.display());
    } else {
        println!("Config already exists at {}", ctx.config_path.display());
    }
    Ok(())
}

use crate::context::Context;
use crate::output::print_json;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum DbSubcommand {
    /// Create the log store schema (idempotent)
    Init,
}

pub fn run(ctx: &Context, subcmd: DbSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DbSubcommand::Init => init(ctx, json),
    }
}

fn init(ctx: &Context, json: bool) -> anyhow::Result<()> {
    if let Some(dir) = ctx.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    ctx.open_store()?;
    tracing::debug!(path = %ctx.db_path.display(), "log store schema ready");

    if json {
        print_json(&serde_json::json!({ "path": ctx.db_path }))
    } else {
        println!("Log store ready at {}", ctx.db_path.display());
        Ok(())
    }
}

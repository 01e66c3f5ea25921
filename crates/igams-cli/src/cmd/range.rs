use crate::context::Context;
use crate::output::{percent, print_json, print_table};
use chrono::NaiveDate;
use igams_core::analysis;

pub fn run(ctx: &Context, start: NaiveDate, end: NaiveDate, json: bool) -> anyhow::Result<()> {
    let actor = ctx.actor()?;
    let store = ctx.open_store()?;
    let series = analysis::metrics_range(&store, &ctx.config, actor, start, end)?;

    if json {
        return print_json(&series);
    }

    let rows = series
        .iter()
        .map(|d| {
            let m = &d.metrics;
            vec![
                d.date.to_string(),
                format!("{}/{}", m.completed_steps, m.total_steps),
                percent(m.execution_accuracy),
                percent(m.time_deviation),
                percent(m.quality_compliance),
                percent(m.process_efficiency),
            ]
        })
        .collect();
    print_table(
        &["DATE", "STEPS", "ACCURACY", "TIME DEV", "QUALITY", "EFFICIENCY"],
        rows,
    );
    Ok(())
}

use crate::context::Context;
use anyhow::Result;
use igams_server::AppState;
use std::sync::Arc;

pub fn run(ctx: Context, port: u16) -> Result<()> {
    let store = ctx.open_store()?;
    // The advisory client is blocking: build and drop it outside the runtime.
    let state = AppState::new(Arc::new(store), ctx.config);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(igams_server::serve(state.clone(), port));
    drop(rt);
    drop(state);
    result
}

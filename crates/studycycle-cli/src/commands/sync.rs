use super::{load_engine, open_sync, print_json, runtime, CliResult};

/// Reconcile local state against the remote store and persist the result.
pub fn run() -> CliResult {
    let mut sync = open_sync()?;
    let mut engine = load_engine(&sync);

    let rt = runtime()?;
    rt.block_on(sync.reconcile(&mut engine));
    sync.observe(&engine);
    rt.block_on(sync.flush());

    print_json(&serde_json::json!({
        "config": engine.config(),
        "timer": engine.timer(),
        "cycle": engine.cycle(),
    }))
}

use chrono::NaiveDate;
use clap::Subcommand;
use studycycle_core::RemoteStore;

use super::{api_url, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List sessions, optionally for one date (YYYY-MM-DD)
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a session by id
    Delete {
        id: i64,
    },
    /// Aggregate statistics for a date range
    Stats {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

pub fn run(action: SessionsAction) -> CliResult {
    let store = RemoteStore::new(&api_url())?;
    let rt = runtime()?;

    match action {
        SessionsAction::List { date } => {
            let sessions = rt.block_on(store.sessions(date))?;
            print_json(&sessions)
        }
        SessionsAction::Delete { id } => {
            rt.block_on(store.delete_session(id))?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        SessionsAction::Stats { from, to } => {
            let stats = rt.block_on(store.stats(from, to))?;
            print_json(&stats)
        }
    }
}

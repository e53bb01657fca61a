use clap::Subcommand;

use super::{load_engine, open_sync, persist, print_json, CliResult};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// Add a subject
    Add {
        /// Subject name
        name: String,
        /// Emphasis weight 1-10
        #[arg(long, default_value = "5")]
        emphasis: u8,
    },
    /// Remove a subject by id
    Remove {
        id: String,
    },
    /// Update a subject's name, emphasis or color
    Set {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        emphasis: Option<u8>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Select the active subject by list position (idle only)
    Switch {
        index: usize,
    },
    /// List subjects with today's allocation and progress
    List,
}

pub fn run(action: SubjectAction) -> CliResult {
    let mut sync = open_sync()?;
    let mut engine = load_engine(&sync);

    match action {
        SubjectAction::Add { name, emphasis } => {
            let id = engine.add_subject(name, emphasis);
            persist(&mut sync, &engine)?;
            print_json(&serde_json::json!({ "added": id }))
        }
        SubjectAction::Remove { id } => {
            if !engine.remove_subject(&id) {
                return Err(format!("no subject with id {id}").into());
            }
            persist(&mut sync, &engine)?;
            print_json(&engine.config().subjects)
        }
        SubjectAction::Set {
            id,
            name,
            emphasis,
            color,
        } => {
            if !engine.update_subject(&id, name.as_deref(), emphasis, color.as_deref()) {
                return Err(format!("no subject with id {id}").into());
            }
            persist(&mut sync, &engine)?;
            print_json(&engine.config().subjects)
        }
        SubjectAction::Switch { index } => {
            let Some(event) = engine.switch_subject(index) else {
                return Err("switch requires an idle timer and a valid index".into());
            };
            print_json(&event)?;
            persist(&mut sync, &engine)
        }
        SubjectAction::List => {
            let progress = &engine.cycle().subject_progress;
            let rows: Vec<_> = engine
                .config()
                .subjects
                .iter()
                .enumerate()
                .map(|(i, subject)| {
                    let entry = progress.iter().find(|p| p.subject_id == subject.id);
                    serde_json::json!({
                        "index": i,
                        "id": subject.id,
                        "name": subject.name,
                        "emphasis": subject.emphasis,
                        "color": subject.color,
                        "allocatedMinutes": entry.map(|p| p.allocated_minutes),
                        "completedMs": entry.map(|p| p.completed_ms),
                        "current": i == engine.cycle().current_subject_index,
                    })
                })
                .collect();
            print_json(&rows)
        }
    }
}

use std::path::PathBuf;

use colored::*;

use lanscope_common::session::{self, SessionId};
use lanscope_core::history::{JsonHistoryStore, ScanHistoryStore};

use crate::commands::HistoryAction;
use crate::terminal::print;

pub async fn history(path: PathBuf, action: HistoryAction) -> anyhow::Result<()> {
    let store = JsonHistoryStore::new(&path);

    match action {
        HistoryAction::List => {
            let summaries = store.list().await?;
            if summaries.is_empty() {
                println!("{}", "History is empty.".dimmed());
                return Ok(());
            }
            print::header("scan history");
            for summary in &summaries {
                print::session_row(summary);
            }
        }

        HistoryAction::Show { id } => {
            let session = store.load(SessionId(id)).await?;
            print::header(&format!("session #{id}"));
            println!(
                "  target {}  status {}  started {}",
                session.parameters.target.to_string().bold(),
                session.status.to_string().yellow(),
                session.started_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!();

            let visible: Vec<_> = session
                .results
                .values()
                .filter(|h| h.is_visible())
                .collect();
            for (idx, host) in visible.iter().enumerate() {
                print::host_tree(idx, host);
                if idx + 1 != visible.len() {
                    println!();
                }
            }

            let distribution = session.port_distribution();
            if !distribution.is_empty() {
                println!();
                println!("{}", "Open-port distribution:".bold());
                for (port, count) in distribution {
                    println!("  {port:>5}: {count}");
                }
            }
        }

        HistoryAction::Delete { id } => {
            store.delete(SessionId(id)).await?;
            println!("Session #{id} deleted.");
        }

        HistoryAction::Diff { earlier, later } => {
            let earlier_session = store.load(SessionId(earlier)).await?;
            let later_session = store.load(SessionId(later)).await?;
            let diff = session::diff_sessions(&earlier_session, &later_session);

            print::header(&format!("diff #{earlier} -> #{later}"));
            if diff.appeared.is_empty() && diff.vanished.is_empty() {
                println!("{}", "No host changes between the two sessions.".dimmed());
                return Ok(());
            }
            for host in &diff.appeared {
                println!(
                    "  {} {} {}",
                    "+".green().bold(),
                    host.address,
                    host.hostname.as_deref().unwrap_or("").dimmed()
                );
            }
            for host in &diff.vanished {
                println!(
                    "  {} {} {}",
                    "-".red().bold(),
                    host.address,
                    host.hostname.as_deref().unwrap_or("").dimmed()
                );
            }
        }
    }

    Ok(())
}

use std::path::PathBuf;

use lanscope_common::session::SessionId;
use lanscope_core::history::{JsonHistoryStore, ScanHistoryStore};
use lanscope_topology::TopologyAnalyzer;

use crate::terminal::print;

pub async fn topology(id: u64, path: PathBuf) -> anyhow::Result<()> {
    let store = JsonHistoryStore::new(&path);
    let session = store.load(SessionId(id)).await?;

    let graph = TopologyAnalyzer::default().analyze(&session);

    print::header(&format!("topology of session #{id}"));
    print::topology(&graph);

    Ok(())
}

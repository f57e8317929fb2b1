//! Watch command: report changes to a backing file until interrupted.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use crossbeam_channel::unbounded;
use livevar::{Document, NotifyWatchService, WatchService};

pub fn run_watch(path: &Path, debounce_ms: u64) -> anyhow::Result<()> {
    if !path.is_file() {
        bail!("{} does not exist", path.display());
    }

    let service = NotifyWatchService::new(debounce_ms);
    let (tx, rx) = unbounded();
    service
        .subscribe(
            path,
            Arc::new(move |changed: &Path| {
                let _ = tx.send(changed.to_path_buf());
            }),
        )
        .with_context(|| format!("cannot watch {}", path.display()))?;

    println!("Watching {} (Ctrl-C to stop)", path.display());

    for changed in rx.iter() {
        match std::fs::read_to_string(&changed) {
            Ok(text) => match Document::parse(&text) {
                Ok(doc) => {
                    let items: usize = doc.groups().map(|g| g.items().count()).sum();
                    livevar::log_event!(
                        "watch",
                        "changed",
                        "{} groups, {items} items",
                        doc.group_count()
                    );
                    println!(
                        "{}: {} groups, {items} items",
                        changed.display(),
                        doc.group_count()
                    );
                }
                Err(e) => eprintln!("{}: parse error: {e}", changed.display()),
            },
            Err(e) => eprintln!("{}: read error: {e}", changed.display()),
        }
    }
    Ok(())
}

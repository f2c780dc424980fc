//! Writes a portable `.tar.gz` snapshot of the whole store.
//!
//! Layout inside the archive:
//! ```text
//! dealerlot/inventory.json     active vehicles
//! dealerlot/deleted.json       soft-deleted vehicles
//! dealerlot/metrics.json       derived aggregates at export time
//! dealerlot/backups/<key>.json every backup ledger entry
//! ```

use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DealerError, Result};
use crate::state::InventoryState;
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const ARCHIVE_ROOT: &str = "dealerlot";

pub fn default_filename(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("dealerlot-{}.tar.gz", now.format("%Y-%m-%d_%H%M%S")))
}

pub fn run<S: DataStore>(store: &S, state: &InventoryState, output: &Path) -> Result<CmdResult> {
    let mut entries: Vec<(String, String)> = vec![
        (
            "inventory.json".to_string(),
            serde_json::to_string_pretty(&state.vehicles)?,
        ),
        (
            "deleted.json".to_string(),
            serde_json::to_string_pretty(&state.deleted_vehicles)?,
        ),
        (
            "metrics.json".to_string(),
            serde_json::to_string_pretty(&json!({
                "totalValue": state.total_value,
                "totalViews": state.total_views,
                "totalLikes": state.total_likes,
                "salesMetrics": state.sales_metrics,
                "inventoryMetrics": state.inventory_metrics,
            }))?,
        ),
    ];

    let backups = store.list_backups()?;
    for entry in &backups {
        let vehicles = store.read_backup(entry)?;
        entries.push((
            format!("backups/{}.json", entry.key),
            serde_json::to_string_pretty(&vehicles)?,
        ));
    }

    let file = File::create(output).map_err(DealerError::Io)?;
    write_archive(file, &entries)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} vehicle(s), {} deleted, {} backup(s) to {}",
        state.vehicles.len(),
        state.deleted_vehicles.len(),
        backups.len(),
        output.display()
    )));
    result.paths.push(output.to_path_buf());
    Ok(result)
}

fn write_archive<W: Write>(writer: W, entries: &[(String, String)]) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();

        tar.append_data(
            &mut header,
            format!("{}/{}", ARCHIVE_ROOT, name),
            content.as_bytes(),
        )
        .map_err(DealerError::Io)?;
    }

    tar.into_inner()
        .map_err(DealerError::Io)?
        .finish()
        .map_err(DealerError::Io)?;
    Ok(())
}

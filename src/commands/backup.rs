// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::db::{backup_db_file, cleanup_backups};

const DAY: u64 = 24 * 60 * 60;

pub fn handle(db_path: &Path, m: &clap::ArgMatches) -> Result<()> {
    let keep_days = *m.get_one::<u64>("keep-days").unwrap_or(&5);
    let dest = backup_db_file(db_path)
        .with_context(|| format!("Failed to back up {}", db_path.display()))?;
    println!("Backed up to {}", dest.display());

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let removed = cleanup_backups(dir, Duration::from_secs(keep_days * DAY))?;
    if removed > 0 {
        println!("Removed {} backup(s) older than {} days", removed, keep_days);
    }
    Ok(())
}

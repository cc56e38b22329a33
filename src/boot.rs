use log::{error, info, warn};
use std::fs;
use std::path::Path;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &["website", "website/db", "website/uploads"];

/// Outcome of the startup checks.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootReport {
    pub warnings: u32,
    pub errors: u32,
}

impl BootReport {
    pub fn ok(&self) -> bool {
        self.errors == 0
    }
}

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories and checks that storage is writable.
pub fn run() -> BootReport {
    run_in(Path::new("."))
}

pub fn run_in(root: &Path) -> BootReport {
    info!("ClaimDesk boot check starting...");
    let mut report = BootReport::default();

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            match fs::create_dir_all(&path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    report.errors += 1;
                }
            }
        }
    }

    // ── 2. Database directory writable ─────────────────
    if let Err(e) = probe_writable(&root.join("website/db")) {
        error!("  Database directory not writable: {}", e);
        report.errors += 1;
    }

    // ── 3. Uploads directory writable ──────────────────
    if let Err(e) = probe_writable(&root.join("website/uploads")) {
        warn!("  Uploads directory not writable: {} (image uploads will fail)", e);
        report.warnings += 1;
    }

    // ── 4. Rocket.toml exists ──────────────────────────
    if !root.join("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        report.warnings += 1;
    }

    // ── Summary ────────────────────────────────────────
    if report.errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s).",
            report.errors, report.warnings
        );
    } else if report.warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            report.warnings
        );
    } else {
        info!("Boot check passed.");
    }
    report
}

fn probe_writable(dir: &Path) -> std::io::Result<()> {
    let test_file = dir.join(".write_test");
    fs::write(&test_file, "test")?;
    let _ = fs::remove_file(&test_file);
    Ok(())
}

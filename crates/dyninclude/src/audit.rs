use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::DynincludeError;
use crate::title::FileRecord;

/// Appends one resolution to the audit log, creating the file if absent:
/// the invoking file, the directive text, the effective shift, and one
/// line per resolved file with its computed level offset.
pub fn append_audit_log(
    logfile: &Path,
    current_file: &Path,
    target: &str,
    level_offset_shifting: i32,
    records: &[FileRecord],
) -> Result<(), DynincludeError> {
    let mut file = OpenOptions::new().create(true).append(true).open(logfile)?;
    writeln!(file, "# File: {}", current_file.display())?;
    writeln!(file, "# Target: {target}")?;
    writeln!(file, "# level-offset-shifting: {level_offset_shifting}")?;
    for record in records {
        writeln!(file, "{} (leveloffset: {:+})", record.key, record.level_offset)?;
    }
    Ok(())
}

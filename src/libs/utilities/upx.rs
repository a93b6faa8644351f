// Optional compression of installed binaries with the external `upx` packer.
// Compression problems never fail a tool: the uncompressed binary is still a valid install.

use crate::libs::utilities::binary::format_bytes;
use crate::{log_debug, log_info, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use std::path::Path;
use std::process::Command;

/// Exit code `upx` uses for "file is already packed".
pub const UPX_ALREADY_COMPRESSED: i32 = 2;

/// Result of one `upx` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpxOutcome {
    Compressed { size: u64, ratio: String },
    AlreadyCompressed,
    Failed(String),
}

/// Handle to an `upx` executable that answered `upx --version`.
#[derive(Debug, Clone)]
pub struct Upx {
    program: String,
}

impl Upx {
    /// Probes for `upx` on the `PATH`.
    pub fn detect() -> Option<Self> {
        Self::detect_program("upx")
    }

    pub fn detect_program(program: &str) -> Option<Self> {
        match Command::new(program).arg("--version").output() {
            Ok(out) if out.status.success() => {
                log_info!("[Upx] {} is available", program.bold());
                Some(Upx {
                    program: program.to_string(),
                })
            }
            Ok(out) => {
                log_warn!("[Upx] '{} --version' exited with {}, compression disabled", program, out.status);
                None
            }
            Err(e) => {
                log_warn!("[Upx] {} is not available ({}), compression disabled", program, e);
                None
            }
        }
    }

    /// Compresses `path` in place with `upx -q -q`.
    pub fn compress(&self, path: &Path) -> UpxOutcome {
        log_info!("[Upx] Compressing {}", path.display());
        let output = match Command::new(&self.program).args(["-q", "-q"]).arg(path).output() {
            Ok(output) => output,
            Err(e) => {
                log_warn!("[Upx] Compression error: {}", e);
                return UpxOutcome::Failed(e.to_string());
            }
        };

        let outcome = match output.status.code() {
            Some(0) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                parse_compressed(&stdout)
                    .unwrap_or_else(|| UpxOutcome::Failed(format!("unexpected upx output: {}", stdout.trim())))
            }
            Some(UPX_ALREADY_COMPRESSED) => UpxOutcome::AlreadyCompressed,
            _ => UpxOutcome::Failed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
        };

        match &outcome {
            UpxOutcome::Compressed { size, ratio } => {
                log_info!("[Upx] Compressed to {} ({})", ratio.green(), format_bytes(*size))
            }
            UpxOutcome::AlreadyCompressed => log_info!("[Upx] Already compressed"),
            UpxOutcome::Failed(reason) => log_warn!("[Upx] Compression error: {}", reason),
        }
        outcome
    }
}

/// Parses the quiet summary line, e.g.
/// `  9695232 ->   3823052   39.43%   linux/amd64   tool`.
fn parse_compressed(stdout: &str) -> Option<UpxOutcome> {
    let fields: Vec<&str> = stdout.split_whitespace().collect();
    log_debug!("[Upx] Output fields: {:?}", fields);
    let size = fields.get(2)?.parse().ok()?;
    let ratio = fields.get(3)?.to_string();
    Some(UpxOutcome::Compressed { size, ratio })
}

// Post-install sanity checks of a binary: its executable header must declare the CPU
// architecture we run on, and the configured check command (if any) must succeed.
// Every failure here is a `FetchError::Validation`, which marks just this tool as invalid.

use crate::libs::errors::FetchError;
use crate::{log_debug, log_info, log_warn};
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
use goblin::Object;
use goblin::elf::header::{EM_386, EM_AARCH64, EM_ARM, EM_X86_64};
use goblin::mach::Mach;
use goblin::mach::cputype::{CPU_TYPE_ARM, CPU_TYPE_ARM64, CPU_TYPE_X86, CPU_TYPE_X86_64};
use goblin::pe::header::{COFF_MACHINE_ARM64, COFF_MACHINE_X86, COFF_MACHINE_X86_64};
use std::fs;
use std::path::Path;
use std::process::Command;

fn elf_arch(machine: u16) -> Option<&'static str> {
    match machine {
        EM_X86_64 => Some("amd64"),
        EM_386 => Some("386"),
        EM_AARCH64 => Some("arm64"),
        EM_ARM => Some("arm"),
        _ => None,
    }
}

fn pe_arch(machine: u16) -> Option<&'static str> {
    match machine {
        COFF_MACHINE_X86_64 => Some("amd64"),
        COFF_MACHINE_X86 => Some("386"),
        COFF_MACHINE_ARM64 => Some("arm64"),
        _ => None,
    }
}

fn mach_arch(cputype: u32) -> Option<&'static str> {
    match cputype {
        CPU_TYPE_X86_64 => Some("amd64"),
        CPU_TYPE_X86 => Some("386"),
        CPU_TYPE_ARM64 => Some("arm64"),
        CPU_TYPE_ARM => Some("arm"),
        _ => None,
    }
}

fn unsupported(format: &str, machine: impl std::fmt::Display) -> FetchError {
    FetchError::validation(format!("unsupported architecture in {format} file: {machine}"))
}

/// Reads the architecture(s) the executable at `path` was built for.
/// Universal Mach-O binaries report every contained architecture.
pub fn binary_arches(path: &Path) -> Result<Vec<&'static str>, FetchError> {
    let bytes = fs::read(path)?;
    let object = Object::parse(&bytes)
        .map_err(|e| FetchError::validation(format!("error reading executable header: {e}")))?;

    match object {
        Object::Elf(elf) => {
            let machine = elf.header.e_machine;
            elf_arch(machine).map(|a| vec![a]).ok_or_else(|| unsupported("ELF", machine))
        }
        Object::PE(pe) => {
            let machine = pe.header.coff_header.machine;
            pe_arch(machine).map(|a| vec![a]).ok_or_else(|| unsupported("PE", machine))
        }
        Object::Mach(Mach::Binary(macho)) => {
            let cputype = macho.header.cputype;
            mach_arch(cputype).map(|a| vec![a]).ok_or_else(|| unsupported("Mach-O", cputype))
        }
        Object::Mach(Mach::Fat(multi)) => {
            let arches = multi
                .arches()
                .map_err(|e| FetchError::validation(format!("error reading universal binary: {e}")))?;
            Ok(arches.iter().filter_map(|a| mach_arch(a.cputype)).collect())
        }
        _ => Err(FetchError::validation("not a recognised executable format")),
    }
}

/// Fails unless the binary at `path` was built for `expected_arch`.
pub fn check_arch(path: &Path, expected_arch: &str) -> Result<(), FetchError> {
    let arches = match binary_arches(path) {
        Ok(arches) => arches,
        Err(e) => {
            log_warn!("[Validate] Arch check failed: {}", e);
            return Err(e);
        }
    };
    log_debug!("[Validate] {} declares {:?}", path.display(), arches);
    if arches.contains(&expected_arch) {
        log_info!("[Validate] Arch matches ({})", expected_arch.green());
        Ok(())
    } else {
        log_warn!(
            "[Validate] Arch doesn't match system: {:?} vs {}",
            arches,
            expected_arch.red()
        );
        Err(FetchError::validation(format!(
            "arch doesn't match system: binary is {arches:?}, system is {expected_arch}"
        )))
    }
}

/// Runs `path` with the whitespace separated `check` arguments and requires a successful exit.
pub fn run_check(path: &Path, check: &str) -> Result<(), FetchError> {
    let output = Command::new(path)
        .args(check.split_whitespace())
        .output()
        .map_err(|e| FetchError::validation(format!("check failed: {e}")))?;
    if output.status.success() {
        log_info!("[Validate] Check successful ('{} {}')", path.display(), check.bold());
        Ok(())
    } else {
        log_warn!(
            "[Validate] Check failed ('{} {}'): {}",
            path.display(),
            check,
            output.status
        );
        Err(FetchError::validation(format!(
            "check failed: '{check}' exited with {}",
            output.status
        )))
    }
}

/// Full validation of an installed binary.
pub fn validate(path: &Path, check: &str, expected_arch: &str) -> Result<(), FetchError> {
    check_arch(path, expected_arch)?;
    if !check.trim().is_empty() {
        run_check(path, check)?;
    }
    Ok(())
}

// Everything that touches the installed executables themselves: finding the binary inside an
// extracted download, copying it into the target directory, making it executable, and moving
// the running executable out of the way when it is about to be replaced.

// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
// Our custom logging macros to give us nicely formatted (and colored!) output.
use crate::libs::utilities::platform::Platform;
use crate::{log_debug, log_info};
use std::fs::{self, File, OpenOptions};
use std::io;
// Only needed on Unix-like systems, where the executable bit has to be set explicitly.
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// File name prefix of executables renamed aside during self-replacement.
/// Such files are deleted at the start of the next run.
pub const OLD_EXECUTABLE_PREFIX: &str = ".toolbox-old.";

/// All names a build of `name` might carry for `platform`:
/// `name.exe`, `name`, `name_os_arch(.exe)` and `name-os_arch(.exe)`.
pub fn candidate_names(name: &str, platform: &Platform) -> Vec<String> {
    vec![
        platform.binary_name(name),
        name.to_string(),
        platform.binary_name(&format!("{}_{}_{}", name, platform.os, platform.arch)),
        platform.binary_name(&format!("{}-{}_{}", name, platform.os, platform.arch)),
    ]
}

/// Searches `dir` for the executable called `file_name` (in any of its [`candidate_names`]).
///
/// Direct entries of `dir` are checked first; only then is each subdirectory searched in turn,
/// depth first. Subdirectories are visited in directory-listing order, so when several nested
/// directories contain a match, which one wins depends on the filesystem.
///
/// # Returns
/// * `Ok(Some(path))` for the first match.
/// * `Ok(None)` if no file in the tree matches.
pub fn find_binary(dir: &Path, file_name: &str, platform: &Platform) -> io::Result<Option<PathBuf>> {
    let names = candidate_names(file_name, platform);
    find_in(dir, &names)
}

fn find_in(dir: &Path, names: &[String]) -> io::Result<Option<PathBuf>> {
    log_debug!("[Locator] Looking for {:?} in {}", names, dir.display());
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let entry_name = entry.file_name();
        if names.iter().any(|n| entry_name.to_str() == Some(n.as_str())) {
            log_debug!("[Locator] Found {}", path.display());
            return Ok(Some(path));
        }
    }
    for sub in subdirs {
        if let Some(found) = find_in(&sub, names)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Copies `source` to `target`, creating or truncating `target`.
pub fn copy_file(source: &Path, target: &Path) -> io::Result<u64> {
    let mut from = File::open(source)?;
    let size = from.metadata()?.len();
    let mut to = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(target)?;
    log_info!(
        "[Install] Copy {} to {} ({})",
        source.display(),
        target.display().to_string().cyan(),
        format_bytes(size)
    );
    io::copy(&mut from, &mut to)
}

/// Sets the executable permission bits (0o755). A no-op outside Unix.
pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
        log_debug!("[Install] Set executable permissions on {}", path.display());
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn comparable(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// If `target` is the currently running executable, renames it to
/// `<dir>/.toolbox-old.<file name>` so the new build can be written in its place.
///
/// # Returns
/// * `Ok(Some(path))` with the renamed-aside location when a rename happened.
/// * `Ok(None)` when `target` is some other file (or does not exist yet).
pub fn rename_if_running(target: &Path, running_executable: &Path) -> io::Result<Option<PathBuf>> {
    if !target.exists() || comparable(target) != comparable(running_executable) {
        return Ok(None);
    }
    let Some(file_name) = target.file_name() else {
        return Ok(None);
    };
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let renamed = dir.join(format!("{}{}", OLD_EXECUTABLE_PREFIX, file_name.to_string_lossy()));
    fs::rename(target, &renamed)?;
    log_info!(
        "[Install] Rename current executable to {}",
        renamed.display().to_string().yellow()
    );
    Ok(Some(renamed))
}

/// Deletes executables a previous run renamed aside. Files that vanish in between are ignored.
pub fn sweep_old_binaries(target_dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in walkdir::WalkDir::new(target_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let is_old = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(OLD_EXECUTABLE_PREFIX));
        if !is_old {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                removed += 1;
                log_info!("[Install] Delete old tool {}", entry.path().display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

/// Human readable byte size with binary prefixes, e.g. `1.5 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}iB", bytes as f64 / div as f64, prefix)
}

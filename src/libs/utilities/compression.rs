// Archive extraction for downloaded release assets.
//
// The archive type is decided by the file name alone; anything unrecognised is treated as a
// bare binary and left untouched. Every entry path is checked to stay inside the destination
// directory before anything is written (zip-slip).

use crate::{log_debug, log_info};
use bzip2::read::BzDecoder;
use colored::Colorize;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use xz2::read::XzDecoder;
use zip::ZipArchive;

/// Archive formats recognised by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarXz,
    TarBz2,
    Zip,
}

impl ArchiveKind {
    /// Detects the archive kind from the file name's suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar.xz") {
            Some(ArchiveKind::TarXz)
        } else if name.ends_with(".tar.bz2") {
            Some(ArchiveKind::TarBz2)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// Extracts `file` into `target`, keeping the archive's directory layout.
///
/// # Returns
/// * `Ok(true)` if `file` was a recognised archive and has been extracted.
/// * `Ok(false)` if the file name is not a known archive (e.g. a bare executable).
/// * `Err` on I/O failures or when an entry would escape `target`.
pub fn extract_archive(file: &Path, target: &Path) -> io::Result<bool> {
    let Some(kind) = ArchiveKind::from_path(file) else {
        log_debug!("[Extract] {} is not an archive, using it as is", file.display());
        return Ok(false);
    };

    log_info!("[Extract] Extracting {}", file.display().to_string().cyan());
    fs::create_dir_all(target)?;

    match kind {
        ArchiveKind::TarGz => untar(GzDecoder::new(File::open(file)?), target)?,
        ArchiveKind::TarXz => untar(XzDecoder::new(File::open(file)?), target)?,
        ArchiveKind::TarBz2 => untar(BzDecoder::new(File::open(file)?), target)?,
        ArchiveKind::Zip => unzip(file, target)?,
    }

    log_debug!("[Extract] Archive contents available at {}", target.display());
    Ok(true)
}

/// Resolves an archive entry name below `target`, rejecting absolute paths and `..`.
pub fn sanitize_entry_path(target: &Path, entry_name: &Path) -> io::Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in entry_name.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("content filepath is tainted: {}", entry_name.display()),
                ));
            }
        }
    }
    Ok(target.join(relative))
}

fn write_entry(reader: &mut impl Read, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;
    io::copy(reader, &mut out)
}

fn untar<R: Read>(reader: R, target: &Path) -> io::Result<()> {
    let mut archive = Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let dest = sanitize_entry_path(target, &entry_path)?;
        match entry.header().entry_type() {
            EntryType::Directory => fs::create_dir_all(&dest)?,
            EntryType::Regular | EntryType::Continuous => {
                let written = write_entry(&mut entry, &dest)?;
                log_debug!("[Extract] {} ({} bytes)", entry_path.display(), written);
            }
            other => {
                log_debug!("[Extract] Skipping {:?} entry {}", other, entry_path.display());
            }
        }
    }
    Ok(())
}

fn unzip(file: &Path, target: &Path) -> io::Result<()> {
    let mut archive = ZipArchive::new(File::open(file)?)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let entry_name = PathBuf::from(entry.name());
        let dest = sanitize_entry_path(target, &entry_name)?;
        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            let written = write_entry(&mut entry, &dest)?;
            log_debug!("[Extract] {} ({} bytes)", entry_name.display(), written);
        }
    }
    Ok(())
}

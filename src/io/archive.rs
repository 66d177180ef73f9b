//! Zip member lookup, extraction, and the aggregate output archive.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::platform::OsTag;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unsafe member path in archive: {0}")]
    UnsafePath(String),
}

/// Find a member matching `base` with the platform's suffix conventions.
///
/// Candidates are tried in priority order: the executable-suffixed name,
/// the library-suffixed name, then the bare name (only meaningful on
/// platforms whose executables carry a suffix). Only the final path
/// segment of each member is compared, so nested members like `bin/tool`
/// still match. Within one candidate the first member in archive order
/// wins.
pub fn find_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    base: &str,
    ostag: OsTag,
) -> Result<Option<usize>, ArchiveError> {
    let mut candidates = vec![format!("{base}{}", ostag.exe_suffix())];
    if !ostag.lib_suffix().is_empty() {
        candidates.push(format!("{base}{}", ostag.lib_suffix()));
    }
    // unix executables have no extension but may appear bare in an archive
    // built for a suffixed platform
    if !ostag.exe_suffix().is_empty() {
        candidates.push(base.to_string());
    }

    for candidate in &candidates {
        for i in 0..archive.len() {
            let member = archive.by_index_raw(i)?;
            if member.is_dir() {
                continue;
            }
            let name = Path::new(member.name())
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            if name.as_deref() == Some(candidate.as_str()) {
                return Ok(Some(i));
            }
        }
    }

    Ok(None)
}

/// Extract an archive member and install it as `output_name` in `outdir`.
///
/// The member is staged in a scoped temp directory, then copied to
/// `outdir/{output_name}{ext}` where the extension comes from the member's
/// own filename. Execute bits for owner, group, and other are added on top
/// of whatever permissions the member carried. Returns the bare output
/// filename.
pub fn install_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    outdir: &Path,
    output_name: &str,
) -> Result<String, ArchiveError> {
    let mut member = archive.by_index(index)?;
    let member_path = member
        .enclosed_name()
        .map(Path::to_path_buf)
        .ok_or_else(|| ArchiveError::UnsafePath(member.name().to_string()))?;

    let out_file = match member_path.extension() {
        Some(ext) => format!("{output_name}.{}", ext.to_string_lossy()),
        None => output_name.to_string(),
    };

    let basename: PathBuf = member_path
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| ArchiveError::UnsafePath(member.name().to_string()))?;

    // stage in a temp dir, then copy into place (handles nested archive
    // paths without recreating them under outdir)
    let staging = tempfile::Builder::new().prefix("relfetch-").tempdir()?;
    let staged = staging.path().join(basename);
    {
        let mut out = File::create(&staged)?;
        io::copy(&mut member, &mut out)?;
    }

    #[cfg(unix)]
    if let Some(mode) = member.unix_mode() {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&staged, fs::Permissions::from_mode(mode))?;
    }

    let out_path = outdir.join(&out_file);
    fs::copy(&staged, &out_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&out_path)?.permissions().mode();
        fs::set_permissions(&out_path, fs::Permissions::from_mode(mode | 0o111))?;
    }

    Ok(out_file)
}

/// Append fetched files from `outdir` into the aggregate archive.
///
/// Opens the archive in append mode when it already exists, otherwise
/// creates it fresh. Each file is stored deflated under its bare filename.
/// Entries are never deduplicated; re-running with the same archive adds
/// another copy of each file.
pub fn append_to_zip(zip_path: &Path, outdir: &Path, files: &[String]) -> Result<(), ArchiveError> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = if zip_path.exists() {
        let file = OpenOptions::new().read(true).write(true).open(zip_path)?;
        ZipWriter::new_append(file)?
    } else {
        ZipWriter::new(File::create(zip_path)?)
    };

    for name in files {
        writer.start_file(name.as_str(), options)?;
        let mut src = File::open(outdir.join(name))?;
        io::copy(&mut src, &mut writer)?;
    }
    writer.finish()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    fn build_zip(members: &[(&str, &[u8])]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options = FileOptions::default();
            for (name, data) in members {
                if name.ends_with('/') {
                    writer.add_directory(*name, options).unwrap();
                } else {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(data).unwrap();
                }
            }
            writer.finish().unwrap();
        }
        cursor.set_position(0);
        ZipArchive::new(cursor).unwrap()
    }

    fn member_name<R: Read + Seek>(archive: &mut ZipArchive<R>, index: usize) -> String {
        archive.by_index_raw(index).unwrap().name().to_string()
    }

    #[test]
    fn test_find_member_exe_suffix_wins_over_bare() {
        // archive order puts the bare name first; the suffixed form must
        // still be chosen on win64
        let mut archive = build_zip(&[("foo", b"bare"), ("foo.exe", b"exe")]);
        let index = find_member(&mut archive, "foo", OsTag::Win64)
            .unwrap()
            .unwrap();
        assert_eq!(member_name(&mut archive, index), "foo.exe");
    }

    #[test]
    fn test_find_member_bare_fallback_on_win64() {
        let mut archive = build_zip(&[("foo", b"bare")]);
        let index = find_member(&mut archive, "foo", OsTag::Win64)
            .unwrap()
            .unwrap();
        assert_eq!(member_name(&mut archive, index), "foo");
    }

    #[test]
    fn test_find_member_nested_path() {
        let mut archive = build_zip(&[("bin/", b""), ("bin/tool", b"elf")]);
        let index = find_member(&mut archive, "tool", OsTag::Linux)
            .unwrap()
            .unwrap();
        assert_eq!(member_name(&mut archive, index), "bin/tool");
    }

    #[test]
    fn test_find_member_library_suffix() {
        let mut archive = build_zip(&[("libgrid.so", b"so")]);
        let index = find_member(&mut archive, "libgrid", OsTag::Linux)
            .unwrap()
            .unwrap();
        assert_eq!(member_name(&mut archive, index), "libgrid.so");
    }

    #[test]
    fn test_find_member_no_bare_fallback_on_linux() {
        // linux defines no exe suffix, so the bare candidate is already
        // covered by the first candidate; "tool.exe" must not match "tool"
        let mut archive = build_zip(&[("tool.exe", b"pe")]);
        assert!(
            find_member(&mut archive, "tool", OsTag::Linux)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_find_member_missing() {
        let mut archive = build_zip(&[("other", b"x")]);
        assert!(
            find_member(&mut archive, "tool", OsTag::Linux)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_find_member_skips_directories() {
        let mut archive = build_zip(&[("tool/", b""), ("tool/tool", b"elf")]);
        let index = find_member(&mut archive, "tool", OsTag::Linux)
            .unwrap()
            .unwrap();
        assert_eq!(member_name(&mut archive, index), "tool/tool");
    }

    #[test]
    fn test_install_member_renames_and_keeps_extension() {
        let dir = tempdir().unwrap();
        let mut archive = build_zip(&[("dist/grid.exe", b"pe bytes")]);
        let index = find_member(&mut archive, "grid", OsTag::Win64)
            .unwrap()
            .unwrap();

        let out = install_member(&mut archive, index, dir.path(), "mygrid").unwrap();
        assert_eq!(out, "mygrid.exe");
        assert_eq!(fs::read(dir.path().join("mygrid.exe")).unwrap(), b"pe bytes");
    }

    #[test]
    fn test_install_member_bare_name() {
        let dir = tempdir().unwrap();
        let mut archive = build_zip(&[("bin/tool", b"elf")]);
        let index = find_member(&mut archive, "tool", OsTag::Linux)
            .unwrap()
            .unwrap();

        let out = install_member(&mut archive, index, dir.path(), "tool").unwrap();
        assert_eq!(out, "tool");
        assert!(dir.path().join("tool").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_member_sets_exec_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let mut archive = build_zip(&[("tool", b"elf")]);
        let index = find_member(&mut archive, "tool", OsTag::Linux)
            .unwrap()
            .unwrap();

        install_member(&mut archive, index, dir.path(), "tool").unwrap();
        let mode = fs::metadata(dir.path().join("tool"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_append_to_zip_creates_then_appends() {
        let dir = tempdir().unwrap();
        let outdir = dir.path().join("out");
        fs::create_dir_all(&outdir).unwrap();
        fs::write(outdir.join("grid"), b"one").unwrap();
        fs::write(outdir.join("mesh"), b"two").unwrap();

        let zip_path = dir.path().join("bundle.zip");
        let files = vec!["grid".to_string(), "mesh".to_string()];
        append_to_zip(&zip_path, &outdir, &files).unwrap();

        let archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        // second run appends duplicates; nothing is replaced
        append_to_zip(&zip_path, &outdir, &files).unwrap();
        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 4);

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index_raw(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names.iter().filter(|n| n.as_str() == "grid").count(),
            2,
            "re-running must duplicate entries"
        );
    }

    #[test]
    fn test_append_stores_bare_names() {
        let dir = tempdir().unwrap();
        let outdir = dir.path().join("out");
        fs::create_dir_all(&outdir).unwrap();
        fs::write(outdir.join("grid"), b"one").unwrap();

        let zip_path = dir.path().join("bundle.zip");
        append_to_zip(&zip_path, &outdir, &["grid".to_string()]).unwrap();

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.by_index_raw(0).unwrap().name(), "grid");
    }
}

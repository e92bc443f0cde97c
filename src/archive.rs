//! tar.gz codec for workspace snapshots.
//!
//! The workspace root maps to the archive root in both directions. Creation
//! and extraction must stay symmetric, or a create/restore round trip would
//! nest the tree one level deeper each cycle.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder};

/// Archive `dir` recursively into a gzip-compressed tarball at `archive_path`.
pub fn pack(dir: &Path, archive_path: &Path) -> io::Result<()> {
    let file = File::create(archive_path)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);
    builder.append_dir_all(".", dir)?;
    let encoder = builder.into_inner()?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    Ok(())
}

/// Extract the archive at `archive_path` into `dir`, mapping the archive root
/// onto `dir` itself.
pub fn unpack(archive_path: &Path, dir: &Path) -> io::Result<()> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = Archive::new(decoder);
    archive.unpack(dir)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn write_fixture(dir: &Path) {
        fs::write(dir.join("a.txt"), "x").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();
        fs::write(dir.join("sub").join("b.txt"), "y").unwrap();
    }

    #[test]
    fn round_trip_reproduces_tree() {
        let source = tempdir().unwrap();
        write_fixture(source.path());

        let staging = tempdir().unwrap();
        let archive_path = staging.path().join("snapshot.tar.gz");
        pack(source.path(), &archive_path).unwrap();

        let restored = tempdir().unwrap();
        unpack(&archive_path, restored.path()).unwrap();

        assert_eq!(fs::read_to_string(restored.path().join("a.txt")).unwrap(), "x");
        assert_eq!(
            fs::read_to_string(restored.path().join("sub").join("b.txt")).unwrap(),
            "y"
        );
    }

    #[test]
    fn repeated_cycles_do_not_nest() {
        let source = tempdir().unwrap();
        write_fixture(source.path());
        let staging = tempdir().unwrap();

        let first = staging.path().join("first.tar.gz");
        pack(source.path(), &first).unwrap();
        let middle = tempdir().unwrap();
        unpack(&first, middle.path()).unwrap();

        let second = staging.path().join("second.tar.gz");
        pack(middle.path(), &second).unwrap();
        let last = tempdir().unwrap();
        unpack(&second, last.path()).unwrap();

        assert!(last.path().join("a.txt").is_file());
        assert!(last.path().join("sub").join("b.txt").is_file());
        // The tree must not have drifted one level deeper.
        assert!(!last.path().join("data").exists());
        assert_eq!(
            fs::read_to_string(last.path().join("sub").join("b.txt")).unwrap(),
            "y"
        );
    }

    #[test]
    fn unpack_rejects_garbage() {
        let staging = tempdir().unwrap();
        let bogus = staging.path().join("bogus.tar.gz");
        fs::write(&bogus, b"not an archive").unwrap();
        let target = tempdir().unwrap();
        assert!(unpack(&bogus, target.path()).is_err());
    }
}

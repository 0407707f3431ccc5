//! Streaming ZIP reader, grounded on the teacher's use of `zip::ZipArchive`
//! in `importers/b3_cotahist.rs` and generalized per spec §4.5: member
//! bodies are read in windows and split on line endings rather than
//! materialized whole, and text is decoded Latin-1 (Brazilian regulatory
//! archives are ISO-8859-1, not UTF-8).

use crate::error::IngestError;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

const WINDOW_SIZE: usize = 64 * 1024;

/// One archive member. Holds the decompressed bytes undecoded: callers
/// that know their text is fixed Latin-1 (COTAHIST, §4.7) can read it via
/// [`ZipMember::lines`]; callers that must probe the encoding first
/// (the CVM transcoder, §4.6a) take the raw bytes via
/// [`ZipMember::into_bytes`] and decode with whichever encoding the probe
/// selected.
pub struct ZipMember {
    pub name: String,
    pub uncompressed_size: u64,
    bytes: Vec<u8>,
}

impl ZipMember {
    /// Lazily decode as Latin-1 and split into lines. Latin-1 maps every
    /// byte to a code point 1:1, so decoding never fails; CRLF and bare LF
    /// are both accepted line terminators.
    pub fn lines(self) -> LatinLineIterator<std::io::Cursor<Vec<u8>>> {
        LatinLineIterator {
            reader: BufReader::with_capacity(WINDOW_SIZE, std::io::Cursor::new(self.bytes)),
            done: false,
        }
    }

    /// The member's raw, undecoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub struct LatinLineIterator<R: Read> {
    reader: BufReader<R>,
    done: bool,
}

impl<R: Read> Iterator for LatinLineIterator<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
                    buf.pop();
                }
                Some(Ok(decode_latin1(&buf)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Open a ZIP archive for streaming. `NotFound` on a missing file,
/// `CorruptedZip` on a non-ZIP/truncated file or an empty archive.
pub struct ZipStreamer {
    archive: ZipArchive<File>,
}

impl ZipStreamer {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IngestError::ExtractionError(format!("not found: {}", path.display()))
            } else {
                IngestError::Io(e)
            }
        })?;

        let archive = ZipArchive::new(file).map_err(|e| {
            IngestError::CorruptedZipError(format!("{}: {}", path.display(), e))
        })?;

        if archive.len() == 0 {
            return Err(IngestError::CorruptedZipError(format!(
                "{}: empty archive",
                path.display()
            )));
        }

        Ok(Self { archive })
    }

    pub fn member_count(&self) -> usize {
        self.archive.len()
    }

    /// Names of every member, in archive order.
    pub fn member_names(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i).map(|s| s.to_string()))
            .collect()
    }

    /// Open one member by index for streaming; buffers the decompressed
    /// bytes into memory since `zip::read::ZipFile` borrows the archive.
    /// The buffer is still read back through a windowed line iterator
    /// rather than split at once, keeping the per-line decode path
    /// identical for small and large members.
    pub fn open_member(&mut self, index: usize) -> Result<ZipMember, IngestError> {
        let mut entry = self.archive.by_index(index).map_err(|e| {
            IngestError::CorruptedZipError(format!("member {}: {}", index, e))
        })?;

        let name = entry.name().to_string();
        let uncompressed_size = entry.size();

        let mut bytes = Vec::with_capacity(uncompressed_size.min(8 * 1024 * 1024) as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| IngestError::CorruptedZipError(format!("{}: {}", name, e)))?;

        Ok(ZipMember {
            name,
            uncompressed_size,
            reader: Box::new(std::io::Cursor::new(bytes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn make_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> std::path::PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (entry_name, contents) in entries {
            writer.start_file(*entry_name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ZipStreamer::open(&dir.path().join("missing.zip")).unwrap_err();
        assert!(matches!(err, IngestError::ExtractionError(_)));
    }

    #[test]
    fn test_non_zip_file_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not_a_zip.zip");
        std::fs::write(&path, b"not a zip file at all").unwrap();
        let err = ZipStreamer::open(&path).unwrap_err();
        assert!(matches!(err, IngestError::CorruptedZipError(_)));
    }

    #[test]
    fn test_empty_archive_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let path = make_zip(dir.path(), "empty.zip", &[]);
        let err = ZipStreamer::open(&path).unwrap_err();
        assert!(matches!(err, IngestError::CorruptedZipError(_)));
    }

    #[test]
    fn test_lines_split_on_crlf_and_lf() {
        let dir = TempDir::new().unwrap();
        let path = make_zip(dir.path(), "quotes.zip", &[("a.txt", b"one\r\ntwo\nthree")]);
        let mut streamer = ZipStreamer::open(&path).unwrap();
        let member = streamer.open_member(0).unwrap();
        let lines: Vec<String> = member.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_latin1_bytes_decode_without_error() {
        let dir = TempDir::new().unwrap();
        let path = make_zip(dir.path(), "quotes.zip", &[("a.txt", &[0xE7, 0xE3, b'\n'])]);
        let mut streamer = ZipStreamer::open(&path).unwrap();
        let member = streamer.open_member(0).unwrap();
        let lines: Vec<String> = member.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].chars().count(), 2);
    }
}

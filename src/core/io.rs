use crate::core::errors::QcError;
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug)]
pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self, QcError> {
        let file = File::open(path)
            .map_err(|e| QcError::Parse(format!("failed to open {}: {}", path.display(), e)))?;
        // SAFETY: read-only file mapping.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| QcError::Parse(format!("failed to mmap {}: {}", path.display(), e)))?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Plain,
    Gzip,
}

pub fn detect_input_kind(path: &Path) -> Result<InputKind, QcError> {
    let mut file = File::open(path)
        .map_err(|e| QcError::Parse(format!("failed to open {}: {}", path.display(), e)))?;
    let mut magic = [0u8; 2];
    let n = file
        .read(&mut magic)
        .map_err(|e| QcError::Parse(format!("failed to read {}: {}", path.display(), e)))?;
    if n == 2 && magic == GZIP_MAGIC {
        Ok(InputKind::Gzip)
    } else {
        Ok(InputKind::Plain)
    }
}

/// The raw bytes of a summary file. Plain files stay memory-mapped,
/// gzipped files are decompressed into an owned buffer up front.
#[derive(Debug)]
pub enum InputBytes {
    Mapped(MmapSource),
    Owned(Vec<u8>),
}

impl InputBytes {
    pub fn open(path: &Path) -> Result<Self, QcError> {
        match detect_input_kind(path)? {
            InputKind::Plain => Ok(InputBytes::Mapped(MmapSource::open(path)?)),
            InputKind::Gzip => {
                let file = File::open(path).map_err(|e| {
                    QcError::Parse(format!("failed to open {}: {}", path.display(), e))
                })?;
                let mut decoder = MultiGzDecoder::new(file);
                let mut buf = Vec::new();
                decoder.read_to_end(&mut buf).map_err(|e| {
                    QcError::Parse(format!("failed to decompress {}: {}", path.display(), e))
                })?;
                Ok(InputBytes::Owned(buf))
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            InputBytes::Mapped(source) => source.bytes(),
            InputBytes::Owned(buf) => buf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pore-qc-io-{}-{}", std::process::id(), name))
    }

    #[test]
    fn plain_file_is_mapped() {
        let path = tmp_path("plain.tsv");
        std::fs::write(&path, b"read_id\trun_id\n").expect("write tmp file");
        assert_eq!(detect_input_kind(&path).expect("detect"), InputKind::Plain);
        let input = InputBytes::open(&path).expect("open");
        assert_eq!(input.bytes(), b"read_id\trun_id\n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn gzip_file_is_decoded() {
        let path = tmp_path("gz.tsv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"read_id\trun_id\nr1\ta\n").expect("encode");
        let compressed = encoder.finish().expect("finish");
        std::fs::write(&path, compressed).expect("write tmp file");
        assert_eq!(detect_input_kind(&path).expect("detect"), InputKind::Gzip);
        let input = InputBytes::open(&path).expect("open");
        assert_eq!(input.bytes(), b"read_id\trun_id\nr1\ta\n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_parse_error() {
        let err = InputBytes::open(Path::new("/nonexistent/summary.txt")).unwrap_err();
        assert!(matches!(err, QcError::Parse(_)));
    }
}

//! Bootstrap loader — materializes the initial document from disk.
//!
//! The source is a single JSON object, optionally wrapped in a zstd frame.
//! A source that cannot be opened or decompressed degrades to an empty
//! document; a source that decompresses but does not parse as a JSON object
//! is fatal and reported as [`LoadError::Parse`].

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::types::{Compression, Document};

/// First four bytes of every zstd frame.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Options controlling how the bootstrap source is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub compression: Compression,
    /// Log every top-level key as a lookup path.
    pub debug_keys: bool,
}

/// Load the bootstrap document from `path`.
pub fn load(path: &Path, opts: LoadOptions) -> Result<Document, LoadError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(?path, error = %e, "bootstrap file unreadable, starting with an empty document");
            return Ok(Document::new());
        }
    };
    let doc = load_from_reader(BufReader::new(file), opts)?;
    info!(?path, keys = doc.len(), "bootstrap document loaded");
    Ok(doc)
}

/// Load the bootstrap document from any buffered byte source.
pub fn load_from_reader<R: BufRead>(mut reader: R, opts: LoadOptions) -> Result<Document, LoadError> {
    let bytes = match read_source(&mut reader, opts.compression) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "bootstrap source unreadable, starting with an empty document");
            return Ok(Document::new());
        }
    };

    let doc: Document = serde_json::from_slice(&bytes)?;
    if opts.debug_keys {
        for key in doc.keys() {
            info!(path = %format!("/ccapi/v1/cardData?{key}"), "document key");
        }
    }
    Ok(doc)
}

fn read_source<R: BufRead>(reader: &mut R, compression: Compression) -> Result<Vec<u8>, LoadError> {
    // Short reads are possible, so pull the full prefix before sniffing it.
    let mut prefix = Vec::with_capacity(ZSTD_MAGIC.len());
    (&mut *reader)
        .take(ZSTD_MAGIC.len() as u64)
        .read_to_end(&mut prefix)?;

    let compressed = match compression {
        Compression::Zstd => true,
        Compression::None => false,
        Compression::Auto => prefix == ZSTD_MAGIC,
    };
    let mut source = Cursor::new(prefix).chain(reader);

    let mut bytes = Vec::new();
    if compressed {
        debug!("decoding zstd bootstrap source");
        let mut decoder = zstd::Decoder::new(source)
            .map_err(|e| LoadError::Decompress(format!("zstd decode: {e}")))?;
        decoder
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::Decompress(format!("zstd decode: {e}")))?;
    } else {
        source.read_to_end(&mut bytes)?;
    }
    Ok(bytes)
}

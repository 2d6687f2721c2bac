//! Program images: a big-endian origin word followed by big-endian words to place there.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use tracing::{info, warn};

use crate::error::LoadError;
use crate::memory::Memory;

/// Where an image landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    pub origin: u16,
    pub words: usize,
}

pub fn read_image<R: Read>(mut reader: R, memory: &mut Memory) -> Result<LoadedImage, LoadError> {
    let origin = match reader.read_u16::<BigEndian>() {
        Ok(origin) => origin,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(LoadError::MissingOrigin),
        Err(e) => return Err(e.into()),
    };

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let words: Vec<u16> = buf.chunks_exact(2).map(BigEndian::read_u16).collect();

    let stored = memory.load(origin, &words);
    if stored < words.len() {
        warn!(
            origin,
            dropped = words.len() - stored,
            "Image runs past the end of memory"
        );
    }

    Ok(LoadedImage {
        origin,
        words: stored,
    })
}

pub fn read_image_file(path: &Path, memory: &mut Memory) -> Result<LoadedImage, LoadError> {
    let file = File::open(path)?;
    let image = read_image(BufReader::new(file), memory)?;
    info!(
        path = %path.display(),
        origin = format_args!("{:#06x}", image.origin),
        words = image.words,
        "Loaded image"
    );
    Ok(image)
}

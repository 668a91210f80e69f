//! Loadable model wrapper.

use std::io::{Read, Seek};
use crate::errors::Result;
use crate::studio::crc::compute_crc;
use crate::studio::read::{is_studio_file, read_stream, read_studio_file};
use crate::studio::types::StudioFile;

/// Anything that can be read and seeked, as a trait object.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// A model asset, as held by an asset cache.
pub trait Model {
    /// Asset name the model was loaded under.
    fn name(&self) -> &str;
    /// Content checksum, 0 if it wasn't computed.
    fn crc(&self) -> u32;
}

/// A decoder for one model format.
pub trait ModelLoader {
    /// Tries to load a model from `source`. Returns `Ok(None)` if the data
    /// isn't in this loader's format.
    fn load(&self, name: &str, source: &mut dyn ReadSeek, compute_crc: bool) -> Result<Option<Box<dyn Model>>>;
}

pub struct StudioModel {
    name: String,
    crc: u32,
    file: StudioFile,
}

impl StudioModel {
    pub fn new(name: String, crc: u32, file: StudioFile) -> StudioModel {
        StudioModel { name, crc, file }
    }

    pub fn file(&self) -> &StudioFile {
        &self.file
    }

    pub fn into_file(self) -> StudioFile {
        self.file
    }
}

impl Model for StudioModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn crc(&self) -> u32 {
        self.crc
    }
}

#[derive(Default)]
pub struct StudioModelLoader;

impl StudioModelLoader {
    /// Like `ModelLoader::load`, but keeps the concrete type.
    pub fn load_studio_model<R>(&self, name: &str, source: &mut R, compute_crc: bool) -> Result<Option<StudioModel>>
    where R: Read + Seek + ?Sized
    {
        let buf = read_stream(source)?;
        self.load_from_bytes(name, &buf, compute_crc)
    }

    pub fn load_from_bytes(&self, name: &str, buf: &[u8], compute_crc: bool) -> Result<Option<StudioModel>> {
        if !is_studio_file(buf) {
            return Ok(None);
        }

        let file = match read_studio_file(buf)? {
            Some(file) => file,
            None => return Ok(None),
        };

        let crc = if compute_crc { self::compute_crc(buf) } else { 0 };

        debug!("loaded studio model {} (crc {:#010x})", name, crc);

        Ok(Some(StudioModel::new(name.to_string(), crc, file)))
    }
}

impl ModelLoader for StudioModelLoader {
    fn load(&self, name: &str, source: &mut dyn ReadSeek, compute_crc: bool) -> Result<Option<Box<dyn Model>>> {
        let model = self.load_studio_model(name, source, compute_crc)?;
        Ok(model.map(|m| Box::new(m) as Box<dyn Model>))
    }
}

//! Model and marker list files.
//!
//! A model is stored as JSON when the path ends in `.json` and in the packed
//! `.mkg` layout otherwise:
//!
//! | bytes | contents |
//! |---|---|
//! | 8 | `MKGMODEL` |
//! | 4 | layout revision, little endian |
//! | 8 | payload length, little endian |
//! | n | bincode encoded [`MarkerGenModel`] |
//!
//! Marker lists handed over by dungeon builders are JSON arrays of
//! [`MarkerInfo`].

use crate::marker::MarkerInfo;
use crate::model::MarkerGenModel;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"MKGMODEL";

/// Newest `.mkg` layout this build reads and the one it writes.
const VERSION: u32 = 1;

#[derive(Debug)]
pub enum ModelIoError {
    Io(std::io::Error),
    /// Packed payload could not be encoded or decoded.
    Bincode(bincode::Error),
    /// JSON model or marker list is malformed or does not match the schema.
    Json(String),
    /// The file does not start with the model header.
    InvalidFormat(String),
    /// The file was written with a newer layout revision.
    UnsupportedVersion(u32),
}

impl std::fmt::Display for ModelIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelIoError::Io(e) => write!(f, "model file access failed: {}", e),
            ModelIoError::Bincode(e) => write!(f, "packed model payload is corrupt: {}", e),
            ModelIoError::Json(e) => write!(f, "model json rejected: {}", e),
            ModelIoError::InvalidFormat(msg) => write!(f, "not a marker generation model: {}", msg),
            ModelIoError::UnsupportedVersion(v) => write!(
                f,
                "model layout revision {} is newer than supported revision {}",
                v, VERSION
            ),
        }
    }
}

impl std::error::Error for ModelIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelIoError::Io(e) => Some(e),
            ModelIoError::Bincode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelIoError {
    fn from(e: std::io::Error) -> Self {
        ModelIoError::Io(e)
    }
}

impl From<bincode::Error> for ModelIoError {
    fn from(e: bincode::Error) -> Self {
        ModelIoError::Bincode(e)
    }
}

impl From<serde_json::Error> for ModelIoError {
    fn from(e: serde_json::Error) -> Self {
        ModelIoError::Json(e.to_string())
    }
}

pub type ModelIoResult<T> = Result<T, ModelIoError>;

fn is_json_path(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(".json")
}

/// Write `model` as JSON for `.json` paths, packed otherwise.
pub fn save_model<P: AsRef<Path>>(model: &MarkerGenModel, path: P) -> ModelIoResult<()> {
    let path = path.as_ref();
    if is_json_path(path) {
        save_model_json(model, path)
    } else {
        save_model_binary(model, path)
    }
}

/// Read a model written by [`save_model`].
pub fn load_model<P: AsRef<Path>>(path: P) -> ModelIoResult<MarkerGenModel> {
    let path = path.as_ref();
    if is_json_path(path) {
        load_model_json(path)
    } else {
        load_model_binary(path)
    }
}

pub fn save_model_binary<P: AsRef<Path>>(model: &MarkerGenModel, path: P) -> ModelIoResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;

    let data = bincode::serialize(model)?;
    writer.write_all(&(data.len() as u64).to_le_bytes())?;
    writer.write_all(&data)?;

    writer.flush()?;
    Ok(())
}

/// Check the model header and return its layout revision.
fn read_header<R: Read>(reader: &mut R) -> ModelIoResult<u32> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        let found = String::from_utf8_lossy(&magic).into_owned();
        return Err(ModelIoError::InvalidFormat(format!("header reads {:?}", found)));
    }

    let mut version_bytes = [0u8; 4];
    reader.read_exact(&mut version_bytes)?;
    Ok(u32::from_le_bytes(version_bytes))
}

pub fn load_model_binary<P: AsRef<Path>>(path: P) -> ModelIoResult<MarkerGenModel> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let version = read_header(&mut reader)?;
    if version > VERSION {
        return Err(ModelIoError::UnsupportedVersion(version));
    }

    let mut size_bytes = [0u8; 8];
    reader.read_exact(&mut size_bytes)?;
    let size = u64::from_le_bytes(size_bytes) as usize;

    let mut data = vec![0u8; size];
    reader.read_exact(&mut data)?;

    Ok(bincode::deserialize(&data)?)
}

pub fn save_model_json<P: AsRef<Path>>(model: &MarkerGenModel, path: P) -> ModelIoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, model)?;
    Ok(())
}

pub fn load_model_json<P: AsRef<Path>>(path: P) -> ModelIoResult<MarkerGenModel> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_markers<P: AsRef<Path>>(markers: &[MarkerInfo], path: P) -> ModelIoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, markers)?;
    Ok(())
}

pub fn load_markers<P: AsRef<Path>>(path: P) -> ModelIoResult<Vec<MarkerInfo>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// What a model file holds, read from its name and header only.
#[derive(Debug, Clone)]
pub struct ModelFileInfo {
    pub format: ModelFormat,
    /// Layout revision of packed models; JSON models carry none.
    pub version: Option<u32>,
    pub file_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Binary,
    Json,
}

/// Inspect a model file without decoding its layers.
pub fn model_file_info<P: AsRef<Path>>(path: P) -> ModelIoResult<ModelFileInfo> {
    let path = path.as_ref();
    let file_size = std::fs::metadata(path)?.len();

    if is_json_path(path) {
        return Ok(ModelFileInfo {
            format: ModelFormat::Json,
            version: None,
            file_size,
        });
    }

    let mut reader = BufReader::new(File::open(path)?);
    let version = read_header(&mut reader)?;
    Ok(ModelFileInfo {
        format: ModelFormat::Binary,
        version: Some(version),
        file_size,
    })
}

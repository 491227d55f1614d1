//! A single font: its raw bytes plus lazily decoded table access.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use write_fonts::{
    read::{FontRef, ReadError, TableProvider},
    types::{NameId, Tag},
};

use crate::{error::DecodeError, testable::EntityId};

/// One font on disk, or one member of a font collection.
///
/// The bytes are shared and immutable. Decoding happens on first use and the
/// outcome, success or failure, is remembered for the rest of the run.
pub struct Font {
    id: EntityId,
    path: PathBuf,
    index: Option<u32>,
    data: Result<Arc<[u8]>, DecodeError>,
    decoded: OnceLock<Result<(), DecodeError>>,
}

impl Font {
    /// A font backed by `data`.
    ///
    /// `index` is the position in a collection, None for a standalone font.
    pub fn new(path: impl Into<PathBuf>, index: Option<u32>, data: Arc<[u8]>) -> Font {
        let path = path.into();
        Font {
            id: EntityId::Font {
                path: path.clone(),
                index,
            },
            path,
            index,
            data: Ok(data),
            decoded: OnceLock::new(),
        }
    }

    /// A font whose file could not even be read.
    ///
    /// It is still an entity; every check that needs it reports the error.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Font {
        let path = path.into();
        let error = DecodeError::Io {
            path: path.clone(),
            reason: reason.to_string(),
        };
        Font {
            id: EntityId::Font {
                path: path.clone(),
                index: None,
            },
            path,
            index: None,
            data: Err(error),
            decoded: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// The file name without directories, for messages.
    pub fn file_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        match self.index {
            Some(idx) => format!("{name}#{idx}"),
            None => name,
        }
    }

    /// The raw bytes, for checks that never decode.
    ///
    /// For a collection member this is the whole collection file.
    pub fn bytes(&self) -> Result<&[u8], DecodeError> {
        self.data.as_deref().map_err(Clone::clone)
    }

    /// Decode the font if that hasn't happened yet.
    ///
    /// Idempotent; concurrent callers block until the first finishes.
    pub fn decode(&self) -> Result<(), DecodeError> {
        self.decoded
            .get_or_init(|| {
                let result = self.parse().map(|_| ());
                if let Err(e) = &result {
                    log::warn!("{e}");
                }
                result
            })
            .clone()
    }

    /// Typed, read-only access to the tables.
    pub fn font_ref(&self) -> Result<FontRef<'_>, DecodeError> {
        self.decode()?;
        self.parse()
    }

    fn parse(&self) -> Result<FontRef<'_>, DecodeError> {
        let data = self.bytes()?;
        let result = match self.index {
            Some(idx) => FontRef::from_index(data, idx),
            None => FontRef::new(data),
        };
        result.map_err(|e| self.read_error(e))
    }

    fn read_error(&self, e: ReadError) -> DecodeError {
        DecodeError::Read {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    pub fn has_table(&self, tag: Tag) -> bool {
        self.font_ref()
            .map(|f| f.table_data(tag).is_some())
            .unwrap_or_default()
    }

    /// The tags of every table in the font, in directory order.
    pub fn table_tags(&self) -> Result<Vec<Tag>, DecodeError> {
        Ok(self
            .font_ref()?
            .table_directory
            .table_records()
            .iter()
            .map(|r| r.tag())
            .collect())
    }

    /// The typographic family name, falling back to the legacy family name.
    pub fn family_name(&self) -> Option<String> {
        let font = self.font_ref().ok()?;
        let name = font.name().ok()?;
        [NameId::TYPOGRAPHIC_FAMILY_NAME, NameId::FAMILY_NAME]
            .into_iter()
            .find_map(|id| {
                name.name_record()
                    .iter()
                    .filter(|record| record.name_id() == id)
                    .find_map(|record| record.string(name.string_data()).ok())
                    .map(|s| s.chars().collect::<String>())
            })
    }

    /// A private, mutable copy of the bytes.
    ///
    /// Checks that need to modify a font work on one of these so the shared
    /// bytes stay untouched for everyone else.
    pub fn working_copy(&self) -> Result<FontCopy, DecodeError> {
        Ok(FontCopy {
            path: self.path.clone(),
            index: self.index,
            data: self.bytes()?.to_vec(),
        })
    }
}

impl Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("id", &self.id)
            .field("len", &self.data.as_ref().map(|d| d.len()))
            .field("decoded", &self.decoded.get())
            .finish()
    }
}

/// An owned copy of a font's bytes.
#[derive(Debug, Clone)]
pub struct FontCopy {
    path: PathBuf,
    index: Option<u32>,
    data: Vec<u8>,
}

impl FontCopy {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    pub fn font_ref(&self) -> Result<FontRef<'_>, DecodeError> {
        let result = match self.index {
            Some(idx) => FontRef::from_index(&self.data, idx),
            None => FontRef::new(&self.data),
        };
        result.map_err(|e| DecodeError::Read {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

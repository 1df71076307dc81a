//! Sized font handles
//!
//! A [`FontFace`] pairs shared font bytes with a face index and a pixel
//! size. Cloning is cheap; resizing shares the same bytes.

use crate::{PaintError, Result};
use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Vertical font metrics scaled to pixels, y pointing up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascender: f32,
    /// Negative below the baseline
    pub descender: f32,
    pub units_per_em: i32,
}

/// A font face at a pixel size
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    size: f32,
}

impl FontFace {
    /// Load a face from raw font data
    pub fn from_data(data: Vec<u8>, index: u32, size: f32) -> Result<Self> {
        ttf_parser::Face::parse(&data, index)
            .map_err(|e| PaintError::FontParse(e.to_string()))?;

        Ok(Self {
            data: Arc::new(data),
            index,
            size,
        })
    }

    /// Load the first face of a font file
    pub fn from_file(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            PaintError::FontLoad(format!("Failed to read font file {:?}: {}", path, e))
        })?;
        Self::from_data(data, 0, size)
    }

    /// Default sans-serif face of the system
    pub fn system_default(size: f32) -> Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();

        let query = Query {
            families: &[Family::SansSerif],
            weight: Weight::NORMAL,
            style: Style::Normal,
            stretch: Stretch::Normal,
        };
        let id = db
            .query(&query)
            .or_else(|| db.faces().next().map(|face| face.id))
            .ok_or(PaintError::NoSystemFont)?;

        let (src, index) = db
            .face_source(id)
            .ok_or_else(|| PaintError::FontLoad("Font source not found".to_string()))?;

        let data = match src {
            Source::File(path) => std::fs::read(&path).map_err(|e| {
                PaintError::FontLoad(format!("Failed to read font file {:?}: {}", path, e))
            })?,
            Source::Binary(arc) => arc.as_ref().as_ref().to_vec(),
            Source::SharedFile(_path, data) => data.as_ref().as_ref().to_vec(),
        };

        tracing::debug!("Loaded system default font (face {}, {} bytes)", index, data.len());
        Self::from_data(data, index, size)
    }

    /// Same face at another size
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            data: Arc::clone(&self.data),
            index: self.index,
            size,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Shaping face over the font bytes
    pub(crate) fn shaper(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, self.index)
    }

    /// Font units to pixels
    pub(crate) fn scale(&self, units_per_em: i32) -> f32 {
        if units_per_em <= 0 {
            0.0
        } else {
            self.size / units_per_em as f32
        }
    }

    pub fn metrics(&self) -> FontMetrics {
        match self.shaper() {
            Some(face) => {
                let upem = face.units_per_em();
                let scale = self.scale(upem);
                FontMetrics {
                    ascender: face.ascender() as f32 * scale,
                    descender: face.descender() as f32 * scale,
                    units_per_em: upem,
                }
            }
            None => FontMetrics {
                ascender: self.size,
                descender: 0.0,
                units_per_em: 0,
            },
        }
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("index", &self.index)
            .field("size", &self.size)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PartialEq for FontFace {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) && self.index == other.index && self.size == other.size
    }
}

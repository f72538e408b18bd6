//! Mosaic protocol: a replayable record of every placement

use crate::analysis::candidate::{Orientation, Pool};
use crate::analysis::matcher::Match;
use crate::io::error::{MosaicError, Result, WithPath, invalid_parameter, malformed_record};
use crate::io::sexpr::{self, Value};
use crate::spatial::placement::{MosaicLayout, Placement};
use crate::spatial::tiling::PixelRect;
use std::fs;
use std::path::{Path, PathBuf};

/// One placed tile as recorded in a protocol
#[derive(Clone, Debug, PartialEq)]
pub struct ProtocolEntry {
    /// Covered area in target pixels
    pub rect: PixelRect,
    /// Source the candidate came from
    pub library: PathBuf,
    /// File name of the candidate within its source
    pub filename: String,
    /// Flip applied when pasting
    pub flip: Orientation,
    /// Score of the match
    pub score: f32,
}

/// Complete record of a mosaic run
#[derive(Clone, Debug, PartialEq)]
pub struct Protocol {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Placements in drawing order
    pub entries: Vec<ProtocolEntry>,
}

impl Protocol {
    /// Describe a layout in terms of library paths and file names
    ///
    /// # Errors
    ///
    /// Returns an error if a placement refers to an index outside the pool
    pub fn from_layout(layout: &MosaicLayout, pool: &Pool) -> Result<Self> {
        let entries = layout
            .placements
            .iter()
            .map(|placement| {
                let index = placement.matched.candidate;
                let (Some(candidate), Some(library)) =
                    (pool.get(index), pool.library_path(index))
                else {
                    return Err(invalid_parameter(
                        "candidate",
                        &index,
                        &format!("pool holds {} candidates", pool.len()),
                    ));
                };
                Ok(ProtocolEntry {
                    rect: placement.rect,
                    library: library.to_path_buf(),
                    filename: candidate.filename().to_owned(),
                    flip: placement.matched.orientation,
                    score: placement.matched.score,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            width: layout.width,
            height: layout.height,
            entries,
        })
    }

    /// Map every entry back onto a pool
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::UnknownCandidate`] for the first entry whose
    /// library and file name match no candidate
    pub fn resolve(&self, pool: &Pool) -> Result<MosaicLayout> {
        let placements = self
            .entries
            .iter()
            .map(|entry| {
                let candidate = pool
                    .find_by_name(&entry.library, &entry.filename)
                    .ok_or_else(|| MosaicError::UnknownCandidate {
                        library: entry.library.clone(),
                        filename: entry.filename.clone(),
                    })?;
                Ok(Placement {
                    rect: entry.rect,
                    matched: Match {
                        candidate,
                        orientation: entry.flip,
                        score: entry.score,
                    },
                })
            })
            .collect::<Result<_>>()?;

        Ok(MosaicLayout {
            width: self.width,
            height: self.height,
            placements,
        })
    }

    /// Encode as a `mosaic` record
    pub fn to_value(&self) -> Value {
        let metapixels = self.entries.iter().map(|entry| {
            Value::tagged(
                "metapixel",
                [
                    Value::tagged(
                        "rect",
                        [entry.rect.x, entry.rect.y, entry.rect.width, entry.rect.height]
                            .map(|v| Value::Integer(i128::from(v))),
                    ),
                    Value::tagged(
                        "library",
                        [Value::Str(entry.library.to_string_lossy().into_owned())],
                    ),
                    Value::tagged("filename", [Value::Str(entry.filename.clone())]),
                    Value::tagged(
                        "flip",
                        [entry.flip.horizontal, entry.flip.vertical]
                            .map(|flag| Value::Integer(i128::from(flag))),
                    ),
                    Value::tagged("score", [Value::Float(f64::from(entry.score))]),
                ],
            )
        });

        Value::tagged(
            "mosaic",
            [
                Value::tagged(
                    "size",
                    [self.width, self.height].map(|v| Value::Integer(i128::from(v))),
                ),
                Value::tagged("metapixels", metapixels),
            ],
        )
    }

    /// Decode a `mosaic` record; `path` names the file in errors
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::MalformedRecord`] if the record does not have
    /// the exact expected shape
    pub fn from_value(value: &Value, path: &Path) -> Result<Self> {
        let bad = |what: &str| malformed_record(path, &format!("bad {what} in protocol"));
        if value.tag() != Some("mosaic") {
            return Err(bad("header"));
        }
        let [size, metapixels] = value.fields() else {
            return Err(bad("mosaic record"));
        };

        let (width, height) = match expect(size, "size", path)? {
            [w, h] => w.as_int::<u32>().zip(h.as_int::<u32>()).ok_or_else(|| bad("size"))?,
            _ => return Err(bad("size")),
        };

        let entries = expect(metapixels, "metapixels", path)?
            .iter()
            .map(|metapixel| entry_from_value(metapixel, path))
            .collect::<Result<_>>()?;

        Ok(Self {
            width,
            height,
            entries,
        })
    }

    /// Write the protocol to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = self.to_value().to_string();
        text.push('\n');
        fs::write(path, text).with_path(path, "write protocol")
    }

    /// Read a protocol from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_path(path, "read protocol")?;
        let value = sexpr::parse(&text).map_err(|e| malformed_record(path, &e))?;
        Self::from_value(&value, path)
    }
}

/// Fields of a list tagged `tag`
fn expect<'v>(value: &'v Value, tag: &str, path: &Path) -> Result<&'v [Value]> {
    if value.tag() == Some(tag) {
        Ok(value.fields())
    } else {
        Err(malformed_record(path, &format!("expected ({tag} ...), found {value}")))
    }
}

fn entry_from_value(value: &Value, path: &Path) -> Result<ProtocolEntry> {
    let bad = |what: &str| malformed_record(path, &format!("bad {what} in metapixel {value}"));
    let [rect, library, filename, flip, score] = expect(value, "metapixel", path)? else {
        return Err(bad("field count"));
    };

    let rect = match expect(rect, "rect", path)? {
        [x, y, w, h] => match (x.as_int(), y.as_int(), w.as_int(), h.as_int()) {
            (Some(x), Some(y), Some(w), Some(h)) => PixelRect::new(x, y, w, h),
            _ => return Err(bad("rect")),
        },
        _ => return Err(bad("rect")),
    };
    let library = match expect(library, "library", path)? {
        [name] => name.as_str().map(PathBuf::from).ok_or_else(|| bad("library"))?,
        _ => return Err(bad("library")),
    };
    let filename = match expect(filename, "filename", path)? {
        [name] => name.as_str().map(str::to_owned).ok_or_else(|| bad("filename"))?,
        _ => return Err(bad("filename")),
    };
    let flip = match expect(flip, "flip", path)? {
        [h, v] => match (h.as_integer(), v.as_integer()) {
            (Some(h @ 0..=1), Some(v @ 0..=1)) => Orientation::new(h == 1, v == 1),
            _ => return Err(bad("flip")),
        },
        _ => return Err(bad("flip")),
    };
    let score = match expect(score, "score", path)? {
        [score] => score.as_float().ok_or_else(|| bad("score"))? as f32,
        _ => return Err(bad("score")),
    };

    Ok(ProtocolEntry {
        rect,
        library,
        filename,
        flip,
        score,
    })
}

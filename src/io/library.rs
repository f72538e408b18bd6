//! Library tables: per-tile metadata records and the prepare step

use crate::analysis::candidate::{Candidate, ContentKey, Pool, PoolSource};
use crate::analysis::features::{FEATURE_LEN, FeatureExtractor, FeatureVector};
use crate::io::configuration::{TABLE_FILE_NAME, TILE_EXTENSIONS};
use crate::io::error::{Result, WithPath, malformed_record};
use crate::io::image::{Scaler, decode_rgb};
use crate::io::progress::ProgressReporter;
use crate::io::sexpr::{self, Value};
use crate::math::color::ColorSpace;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metadata of one prepared tile file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRecord {
    /// File name within the library directory
    pub filename: String,
    /// Content identity of the file
    pub content: ContentKey,
    /// RGB feature grid
    pub rgb: FeatureVector,
    /// Tile coordinate of origin when the tile was cut from an image
    pub anti: Option<(u32, u32)>,
}

impl TileRecord {
    /// Encode as a `tile` record
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            Value::tagged("filename", [Value::Str(self.filename.clone())]),
            Value::tagged(
                "checksum",
                [Value::Integer(i128::from(self.content.checksum))],
            ),
            Value::tagged("length", [Value::Integer(i128::from(self.content.length))]),
            Value::tagged(
                "subpixels",
                self.rgb
                    .values()
                    .iter()
                    .map(|&v| Value::Integer(i128::from(v))),
            ),
        ];
        if let Some((x, y)) = self.anti {
            fields.push(Value::tagged(
                "anti",
                [Value::Integer(i128::from(x)), Value::Integer(i128::from(y))],
            ));
        }
        Value::tagged("tile", fields)
    }

    /// Decode a `tile` record; `path` names the table in errors
    ///
    /// # Errors
    ///
    /// Returns [`crate::MosaicError::MalformedRecord`] if any field is missing,
    /// out of order or out of range
    pub fn from_value(value: &Value, path: &Path) -> Result<Self> {
        if value.tag() != Some("tile") {
            return Err(malformed_record(
                path,
                &format!("expected tile record, found {value}"),
            ));
        }
        let mut fields = value.fields().iter();
        let mut next = |tag: &str| {
            fields
                .next()
                .filter(|field| field.tag() == Some(tag))
                .map(Value::fields)
                .ok_or_else(|| malformed_record(path, &format!("missing ({tag} ...) field")))
        };

        let filename = single(next("filename")?)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed_record(path, &"filename must be a string"))?
            .to_owned();
        let checksum = single(next("checksum")?)
            .and_then(Value::as_int::<u64>)
            .ok_or_else(|| malformed_record(path, &format!("bad checksum for '{filename}'")))?;
        let length = single(next("length")?)
            .and_then(Value::as_int::<u64>)
            .ok_or_else(|| malformed_record(path, &format!("bad length for '{filename}'")))?;

        let subpixels = next("subpixels")?
            .iter()
            .map(Value::as_int::<u8>)
            .collect::<Option<Vec<u8>>>()
            .and_then(|values| FeatureVector::from_slice(&values))
            .ok_or_else(|| {
                malformed_record(
                    path,
                    &format!("'{filename}' needs {FEATURE_LEN} subpixels in 0..=255"),
                )
            })?;

        let anti = match fields.next() {
            None => None,
            Some(field) if field.tag() == Some("anti") => {
                let coordinate = match field.fields() {
                    [x, y] => x.as_int::<u32>().zip(y.as_int::<u32>()),
                    _ => None,
                };
                let coordinate = coordinate.ok_or_else(|| {
                    malformed_record(path, &format!("bad anti field for '{filename}'"))
                })?;
                Some(coordinate)
            }
            Some(other) => {
                return Err(malformed_record(path, &format!("unexpected field {other}")));
            }
        };
        if let Some(extra) = fields.next() {
            return Err(malformed_record(path, &format!("unexpected field {extra}")));
        }

        Ok(Self {
            filename,
            content: ContentKey { length, checksum },
            rgb: subpixels,
            anti,
        })
    }
}

fn single(fields: &[Value]) -> Option<&Value> {
    match fields {
        [value] => Some(value),
        _ => None,
    }
}

/// Location of the table inside a library directory
pub fn table_path(library: &Path) -> PathBuf {
    library.join(TABLE_FILE_NAME)
}

/// Read every record of a library table
///
/// # Errors
///
/// Returns an error if the table cannot be read or a record is malformed
pub fn read_table(library: &Path) -> Result<Vec<TileRecord>> {
    let path = table_path(library);
    let text = fs::read_to_string(&path).with_path(&path, "read table")?;
    sexpr::parse_all(&text)
        .map_err(|e| malformed_record(&path, &e))?
        .iter()
        .map(|value| TileRecord::from_value(value, &path))
        .collect()
}

/// Append records to a library table, creating it when absent
///
/// # Errors
///
/// Returns an error if the table cannot be opened or written
pub fn append_records(library: &Path, records: &[TileRecord]) -> Result<()> {
    let path = table_path(library);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_path(&path, "open table")?;

    let mut text = String::new();
    for record in records {
        text.push_str(&record.to_value().to_string());
        text.push('\n');
    }
    file.write_all(text.as_bytes())
        .with_path(&path, "append table")
}

/// Content identity of a file: its length and the leading 8 digest bytes
pub fn content_key(bytes: &[u8]) -> ContentKey {
    let digest = Sha256::digest(bytes);
    let mut leading = [0u8; 8];
    for (slot, byte) in leading.iter_mut().zip(digest.iter()) {
        *slot = *byte;
    }
    ContentKey {
        length: bytes.len() as u64,
        checksum: u64::from_be_bytes(leading),
    }
}

/// Counts reported by [`prepare_library`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    /// Records appended to the table
    pub added: usize,
    /// Files whose content matched an earlier tile
    pub duplicates: usize,
    /// Files already present in the table
    pub already_prepared: usize,
}

fn is_tile_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                TILE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
}

/// Scan a directory for tile images and append records for new ones
///
/// Files already listed in the table are skipped, as are files whose
/// content duplicates a tile seen earlier.
///
/// # Errors
///
/// Returns an error if:
/// - The directory or an existing table cannot be read
/// - A tile file cannot be decoded
/// - The table cannot be written
pub fn prepare_library<S: Scaler>(
    library: &Path,
    extractor: &FeatureExtractor<S>,
    progress: &ProgressReporter,
) -> Result<PrepareSummary> {
    let existing = if table_path(library).exists() {
        read_table(library)?
    } else {
        Vec::new()
    };

    let mut pool = Pool::new();
    let source = pool.add_source(PoolSource::Library(library.to_path_buf()));
    let known: HashSet<String> = existing.iter().map(|r| r.filename.clone()).collect();
    for record in &existing {
        pool.push(candidate_from_record(record, source, ColorSpace::Rgb));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(library)
        .with_path(library, "read library directory")?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .with_path(library, "read library directory")?;
    files.retain(|path| is_tile_file(path));
    files.sort();

    progress.reset("preparing", files.len() as u64);
    let mut summary = PrepareSummary::default();
    let mut records = Vec::new();

    for path in &files {
        progress.advance(1);
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if known.contains(&filename) {
            summary.already_prepared += 1;
            continue;
        }

        let bytes = fs::read(path).with_path(path, "read tile")?;
        let content = content_key(&bytes);
        if pool.find_content(content).is_some() {
            debug!(filename, "duplicate content");
            summary.duplicates += 1;
            continue;
        }

        let rgb = extractor.extract_raw(&decode_rgb(&bytes, path)?)?;
        let record = TileRecord {
            filename,
            content,
            rgb,
            anti: None,
        };
        pool.push(candidate_from_record(&record, source, ColorSpace::Rgb));
        records.push(record);
    }

    append_records(library, &records)?;
    progress.finish();

    summary.added = records.len();
    info!(
        library = %library.display(),
        added = summary.added,
        duplicates = summary.duplicates,
        already_prepared = summary.already_prepared,
        "library prepared"
    );
    Ok(summary)
}

fn candidate_from_record(record: &TileRecord, source: usize, space: ColorSpace) -> Candidate {
    let candidate = Candidate::new(record.filename.clone(), source, &record.rgb, space)
        .with_content(record.content);
    match record.anti {
        Some((x, y)) => candidate.with_anti(x, y),
        None => candidate,
    }
}

/// Add every tile of a prepared library to a pool
///
/// Returns the number of candidates added; tiles whose content is already in
/// the pool are skipped.
///
/// # Errors
///
/// Returns an error if the table cannot be read or is malformed
pub fn load_library(pool: &mut Pool, library: &Path, space: ColorSpace) -> Result<usize> {
    let records = read_table(library)?;
    let source = pool.add_source(PoolSource::Library(library.to_path_buf()));

    let added = records
        .iter()
        .filter_map(|record| pool.push_unique(candidate_from_record(record, source, space)))
        .count();

    info!(
        library = %library.display(),
        added,
        skipped = records.len() - added,
        "library loaded"
    );
    Ok(added)
}

/// Build a pool from several prepared libraries
///
/// # Errors
///
/// Returns an error if any table cannot be read or is malformed
pub fn load_pool(libraries: &[PathBuf], space: ColorSpace) -> Result<Pool> {
    let mut pool = Pool::new();
    for library in libraries {
        load_library(&mut pool, library, space)?;
    }
    Ok(pool)
}

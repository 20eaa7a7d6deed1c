//! Product title and archive entry naming grammars
//!
//! Sentinel-2 products and the band images inside their archives follow two
//! fixed-width naming conventions:
//!
//! - Product title: `{mission}_{type}_{datatake}_N{baseline}_R{orbit}_T{tile}_{date}T{time}`
//!   (e.g., `S2A_MSIL1C_20181130T011721_N0207_R088_T52JFS_20181130T024335`)
//! - Band image filename: `T{tile}_{date}T{time}_{band}.jp2`
//!   (e.g., `T52JFS_20181130T011721_B04.jp2`)
//!
//! Both grammars are matched case-insensitively by small dedicated parsers.
//! A failed match is not an error: a title that does not parse falls back to
//! raw-title output naming, and an entry that does not parse is simply not a
//! band image. All functions here are pure and do no I/O.

/// Band code of the browse/preview image shipped inside each product.
pub const PREVIEW_BAND: &str = "PVI";

/// Band code of the true-color composite image.
pub const TRUE_COLOR_BAND: &str = "TCI";

/// File extension of band rasters inside the archive (JPEG 2000).
pub const RASTER_EXTENSION: &str = "jp2";

/// File extension of derived browse previews.
pub const PREVIEW_EXTENSION: &str = "png";

/// Structured fields of a product title.
///
/// Field widths follow the L1C naming convention; the tile id and band codes
/// are normalized to uppercase, dates and times are kept as the digit strings
/// `YYYYMMDD` and `HHMMSS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTitle {
    /// Mission code (e.g., "S2A").
    pub mission: String,
    /// Product type (6-8 characters, e.g., "MSIL1C").
    pub product_type: String,
    /// Datatake identifier (15 characters).
    pub datatake: String,
    /// Processing baseline (4 digits after the `N` marker).
    pub baseline: String,
    /// Relative orbit (3 digits after the `R` marker).
    pub orbit: String,
    /// Tile grid reference (5 characters after the `T` marker), uppercase.
    pub tile_id: String,
    /// Acquisition date, `YYYYMMDD`.
    pub date: String,
    /// Acquisition time, `HHMMSS`.
    pub time: String,
}

impl ProductTitle {
    /// Parse a product title, returning `None` when it does not match the
    /// grammar.
    ///
    /// The match is a prefix match: titles carry trailing segments (such as a
    /// second datatake discriminator) that are ignored here.
    pub fn parse(title: &str) -> Option<Self> {
        let segments: Vec<&str> = title.split('_').collect();
        if segments.len() < 7 {
            return None;
        }

        let mission = exact_alnum(segments[0], 3)?;
        let product_type = ranged_alnum(segments[1], 6, 8)?;
        let datatake = exact_alnum(segments[2], 15)?;
        let baseline = tagged_digits(segments[3], 'N', 4)?;
        let orbit = tagged_digits(segments[4], 'R', 3)?;
        let tile_id = tagged_alnum(segments[5], 'T', 5)?;
        let (date, time) = date_time(segments[6])?;

        Some(Self {
            mission: mission.to_string(),
            product_type: product_type.to_string(),
            datatake: datatake.to_string(),
            baseline: baseline.to_string(),
            orbit: orbit.to_string(),
            tile_id: tile_id.to_uppercase(),
            date: date.to_string(),
            time: time.to_string(),
        })
    }
}

/// Structured fields of a band image filename inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryName {
    /// Tile grid reference, uppercase.
    pub tile_id: String,
    /// Acquisition date, `YYYYMMDD`.
    pub date: String,
    /// Acquisition time, `HHMMSS`.
    pub time: String,
    /// Band code (3 characters, e.g., "B04", "TCI", "PVI"), uppercase.
    pub band: String,
}

impl EntryName {
    /// Parse an archive entry base filename, returning `None` when it is not
    /// a band image.
    pub fn parse(name: &str) -> Option<Self> {
        let (stem, extension) = name.rsplit_once('.')?;
        if !extension.eq_ignore_ascii_case(RASTER_EXTENSION) {
            return None;
        }

        let segments: Vec<&str> = stem.split('_').collect();
        if segments.len() != 3 {
            return None;
        }

        let tile_id = tagged_alnum(segments[0], 'T', 5)?;
        let (date, time) = date_time(segments[1])?;
        if segments[1].len() != 15 {
            return None;
        }
        let band = exact_alnum(segments[2], 3)?;

        Some(Self {
            tile_id: tile_id.to_uppercase(),
            date: date.to_string(),
            time: time.to_string(),
            band: band.to_uppercase(),
        })
    }
}

/// Compose the canonical output filename for a selected band.
///
/// The preview band drops the band suffix: its derived preview carries the
/// tile/timestamp stem alone.
pub fn compose_output_name(tile_id: &str, date: &str, time_qualifier: &str, band: &str) -> String {
    if band == PREVIEW_BAND {
        format!("{tile_id}_{date}_T{time_qualifier}.{RASTER_EXTENSION}")
    } else {
        format!("{tile_id}_{date}_T{time_qualifier}_{band}.{RASTER_EXTENSION}")
    }
}

fn is_alnum(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn exact_alnum(s: &str, len: usize) -> Option<&str> {
    (s.len() == len && is_alnum(s)).then_some(s)
}

fn ranged_alnum(s: &str, min: usize, max: usize) -> Option<&str> {
    (s.len() >= min && s.len() <= max && is_alnum(s)).then_some(s)
}

/// Match `{tag}{len alphanumerics}` case-insensitively, e.g. `T52JFS`.
fn tagged_alnum(s: &str, tag: char, len: usize) -> Option<&str> {
    let rest = strip_tag(s, tag)?;
    (rest.len() == len && is_alnum(rest)).then_some(rest)
}

/// Match `{tag}{len digits}`, e.g. `R088`.
fn tagged_digits(s: &str, tag: char, len: usize) -> Option<&str> {
    let rest = strip_tag(s, tag)?;
    (rest.len() == len && is_digits(rest)).then_some(rest)
}

fn strip_tag(s: &str, tag: char) -> Option<&str> {
    let first = s.chars().next()?;
    if first.eq_ignore_ascii_case(&tag) {
        Some(&s[first.len_utf8()..])
    } else {
        None
    }
}

/// Match the `{8 digits}T{6 digits}` timestamp field as a prefix, returning
/// the date and time digit strings.
fn date_time(s: &str) -> Option<(&str, &str)> {
    if s.len() < 15 {
        return None;
    }
    let date = &s[..8];
    let marker = &s[8..9];
    let time = &s[9..15];
    if is_digits(date) && marker.eq_ignore_ascii_case("T") && is_digits(time) {
        Some((date, time))
    } else {
        None
    }
}

//! Content type inference from file names
//!
//! The table is built once on first use and never mutated. It carries the
//! meteorological formats WIS 2.0 products use alongside common ones.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Two-part extensions and the registered extension they stand for
const COMPOUND_EXTENSIONS: &[(&str, &str)] = &[(".bufr.bin", ".bufr"), (".grib.bin", ".grib")];

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // WMO table-driven codes
        ("bufr", "application/bufr"),
        ("bufr4", "application/bufr"),
        ("grib", "application/grib"),
        ("grib2", "application/grib"),
        ("grb", "application/grib"),
        ("grb2", "application/grib"),
        // Scientific containers
        ("nc", "application/netcdf"),
        ("nc4", "application/netcdf"),
        ("cdf", "application/netcdf"),
        ("h5", "application/x-hdf5"),
        ("hdf5", "application/x-hdf5"),
        ("he5", "application/x-hdf5"),
        ("hdf", "application/x-hdf"),
        // Text and documents
        ("json", "application/json"),
        ("geojson", "application/geo+json"),
        ("xml", "application/xml"),
        ("txt", "text/plain"),
        ("csv", "text/csv"),
        ("html", "text/html"),
        ("htm", "text/html"),
        ("pdf", "application/pdf"),
        // Imagery
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("webp", "image/webp"),
        // Archives
        ("gz", "application/gzip"),
        ("bz2", "application/x-bzip2"),
        ("zip", "application/zip"),
        ("tar", "application/x-tar"),
    ])
});

/// Infer the content type of `path` from its file name
///
/// Never fails: unknown or missing extensions map to [`OCTET_STREAM`].
pub fn mime_type_for(path: &Path) -> &'static str {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return OCTET_STREAM;
    };
    let mut name = name.to_ascii_lowercase();

    if let Some((compound, base)) = COMPOUND_EXTENSIONS
        .iter()
        .find(|(compound, _)| name.ends_with(compound))
    {
        name.truncate(name.len() - compound.len());
        name.push_str(base);
    }

    Path::new(&name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_TYPES.get(ext).copied())
        .unwrap_or(OCTET_STREAM)
}

//! Property listings read from the input CSV file.

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("failed to open listings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse listing row {row}: {source}")]
    Parse {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// One row of the input file.
///
/// Columns other than these (rating, latitude, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub room_type: String,
    /// Kept as text; it only ever ends up inside a prompt.
    pub price: String,
}

/// Read every listing from a CSV file, preserving row order.
pub fn read_listings<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>, ListingError> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_listings(file)
}

/// Parse listings from any CSV source with a header row.
pub fn parse_listings<R: Read>(source: R) -> Result<Vec<Listing>, ListingError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);

    let mut listings = Vec::new();
    for (index, result) in reader.deserialize::<Listing>().enumerate() {
        let listing = result.map_err(|source| ListingError::Parse {
            row: index + 1,
            source,
        })?;
        listings.push(listing);
    }

    tracing::debug!(count = listings.len(), "read listings");
    Ok(listings)
}

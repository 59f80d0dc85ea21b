//! Sled-based storage for generated records.
//!
//! One tree per record kind. Keys are ids generated by sled, which grow
//! monotonically, so iteration returns records in the order they were created.

use crate::records::{PropertySummary, Rating, RatingReview, RewrittenListing};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

const RATINGS_TREE: &str = "rating_reviews";
const SUMMARIES_TREE: &str = "property_summaries";
const REWRITES_TREE: &str = "rewritten_listings";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("rating {0} does not fit a decimal(3,1) column")]
    RatingOutOfRange(Rating),
}

/// Storage for rating/review, summary and rewrite records.
pub struct Storage {
    db: sled::Db,
    ratings: sled::Tree,
    summaries: sled::Tree,
    rewrites: sled::Tree,
}

impl Storage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_db(sled::open(path)?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            ratings: db.open_tree(RATINGS_TREE)?,
            summaries: db.open_tree(SUMMARIES_TREE)?,
            rewrites: db.open_tree(REWRITES_TREE)?,
            db,
        })
    }

    /// Store a generated rating and review.
    ///
    /// Rejects ratings of 100.0 and above, which the rating column cannot hold.
    pub fn create_rating_review(&self, record: &RatingReview) -> Result<(), StorageError> {
        if record.rating > Rating::COLUMN_MAX {
            return Err(StorageError::RatingOutOfRange(record.rating));
        }
        self.insert(&self.ratings, record)
    }

    pub fn create_summary(&self, record: &PropertySummary) -> Result<(), StorageError> {
        self.insert(&self.summaries, record)
    }

    pub fn create_rewrite(&self, record: &RewrittenListing) -> Result<(), StorageError> {
        self.insert(&self.rewrites, record)
    }

    pub fn rating_reviews(&self) -> Result<Vec<RatingReview>, StorageError> {
        Self::list(&self.ratings)
    }

    pub fn summaries(&self) -> Result<Vec<PropertySummary>, StorageError> {
        Self::list(&self.summaries)
    }

    pub fn rewrites(&self) -> Result<Vec<RewrittenListing>, StorageError> {
        Self::list(&self.rewrites)
    }

    fn insert<T: Serialize>(&self, tree: &sled::Tree, record: &T) -> Result<(), StorageError> {
        let key = self.db.generate_id()?;
        let value = serde_json::to_vec(record)?;
        tree.insert(key.to_be_bytes(), value)?;
        tree.flush()?;
        Ok(())
    }

    fn list<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, StorageError> {
        let mut results = Vec::new();
        for item in tree.iter() {
            let (_key, value) = item?;
            results.push(serde_json::from_slice(&value)?);
        }
        Ok(results)
    }
}

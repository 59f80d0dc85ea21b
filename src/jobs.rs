//! Batch jobs: one sequential pass over the listings per job.
//!
//! Each row costs one completion call per generated field. A failed call or an
//! unparsable answer never stops the pass; its fallback value is stored instead.
//! Storage errors do stop it.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::completion::CompletionSource;
use crate::interpreter::{self, Interpreted};
use crate::listing::Listing;
use crate::prompts;
use crate::records::{truncate_chars, PropertySummary, RatingReview, RewrittenListing};
use crate::storage::{Storage, StorageError};

/// Property ids already handled in a pass.
pub type SeenIds = HashSet<i64>;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("failed to store record for property {property_id}: {source}")]
    Storage {
        property_id: i64,
        #[source]
        source: StorageError,
    },
}

/// What processing a single row produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowOutcome {
    /// Generated fields that hold a fallback value
    pub fallbacks: usize,
}

/// Counts for one finished pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub job: &'static str,
    pub processed: usize,
    pub skipped_duplicates: usize,
    pub fallbacks: usize,
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} processed, {} duplicates skipped, {} fallback values",
            self.job, self.processed, self.skipped_duplicates, self.fallbacks
        )
    }
}

#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self, listing: &Listing, storage: &Storage) -> Result<RowOutcome, JobError>;
}

/// Run `job` over `listings` in order, skipping ids already in `seen`.
///
/// The set is handed back with every processed id added, so a caller can carry
/// it into another pass over the same job.
pub async fn run_pass<J: Job + ?Sized>(
    job: &J,
    listings: &[Listing],
    mut seen: SeenIds,
    storage: &Storage,
) -> Result<(PassReport, SeenIds), JobError> {
    let mut report = PassReport {
        job: job.name(),
        ..PassReport::default()
    };

    for listing in listings {
        if !seen.insert(listing.id) {
            tracing::debug!(job = job.name(), id = listing.id, "skipping duplicate row");
            report.skipped_duplicates += 1;
            continue;
        }

        let outcome = job.process(listing, storage).await?;
        report.processed += 1;
        report.fallbacks += outcome.fallbacks;
    }

    tracing::info!("{}", report);
    Ok((report, seen))
}

fn note_fallback<T>(field: &str, listing: &Listing, parsed: &Interpreted<T>) -> usize {
    if let Some(reason) = &parsed.fallback {
        tracing::warn!(id = listing.id, title = %listing.title, "{} fell back: {}", field, reason);
    }
    usize::from(parsed.is_fallback())
}

fn storage_error(listing: &Listing) -> impl FnOnce(StorageError) -> JobError {
    let property_id = listing.id;
    move |source| JobError::Storage {
        property_id,
        source,
    }
}

/// Rating plus review, two completion calls per row.
pub struct RatingReviewJob<C> {
    source: C,
}

impl<C: CompletionSource> RatingReviewJob<C> {
    pub fn new(source: C) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<C: CompletionSource> Job for RatingReviewJob<C> {
    fn name(&self) -> &'static str {
        "rating-review"
    }

    async fn process(&self, listing: &Listing, storage: &Storage) -> Result<RowOutcome, JobError> {
        let rating = self.source.complete(&prompts::rating_prompt(listing)).await;
        let rating = interpreter::extract_rating(&rating);

        let review = self.source.complete(&prompts::review_prompt(listing)).await;
        let review = interpreter::extract_review(&review);

        let fallbacks =
            note_fallback("rating", listing, &rating) + note_fallback("review", listing, &review);

        let record = RatingReview::new(listing.id, rating.value, review.value);
        storage
            .create_rating_review(&record)
            .map_err(storage_error(listing))?;
        tracing::info!("{}", record);

        Ok(RowOutcome { fallbacks })
    }
}

/// One summary per row.
pub struct SummaryJob<C> {
    source: C,
}

impl<C: CompletionSource> SummaryJob<C> {
    pub fn new(source: C) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<C: CompletionSource> Job for SummaryJob<C> {
    fn name(&self) -> &'static str {
        "summary"
    }

    async fn process(&self, listing: &Listing, storage: &Storage) -> Result<RowOutcome, JobError> {
        let completion = self.source.complete(&prompts::summary_prompt(listing)).await;
        let summary = interpreter::extract_summary(&completion);
        let fallbacks = note_fallback("summary", listing, &summary);

        let record = PropertySummary::new(listing.id, summary.value);
        storage
            .create_summary(&record)
            .map_err(storage_error(listing))?;
        tracing::info!("{}", record);

        Ok(RowOutcome { fallbacks })
    }
}

/// Rewritten title and description per row.
pub struct RewriteJob<C> {
    source: C,
    title_max_chars: usize,
}

impl<C: CompletionSource> RewriteJob<C> {
    /// Rewritten titles are cut to `title_max_chars` before they are stored.
    pub fn new(source: C, title_max_chars: usize) -> Self {
        Self {
            source,
            title_max_chars,
        }
    }
}

#[async_trait]
impl<C: CompletionSource> Job for RewriteJob<C> {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    async fn process(&self, listing: &Listing, storage: &Storage) -> Result<RowOutcome, JobError> {
        let prompt = prompts::rewrite_prompt(&listing.title, &listing.description);
        let completion = self.source.complete(&prompt).await;
        let rewrite =
            interpreter::extract_title_description(&completion, &listing.title, &listing.description);
        let fallbacks = note_fallback("rewrite", listing, &rewrite);

        let rewrite = rewrite.into_value();
        let title = truncate_chars(&rewrite.title, self.title_max_chars);
        let record = RewrittenListing::new(title, rewrite.description);
        storage
            .create_rewrite(&record)
            .map_err(storage_error(listing))?;
        tracing::info!(id = listing.id, "rewrote as {:?}", record.title);

        Ok(RowOutcome { fallbacks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{Completion, CompletionFailure};
    use std::sync::Mutex;

    /// Replies with canned completions chosen by prompt prefix and records every prompt.
    struct Scripted {
        replies: Vec<(&'static str, Completion)>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<(&'static str, Completion)>) -> Self {
            Self {
                replies,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionSource for &Scripted {
        async fn complete(&self, prompt: &str) -> Completion {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .iter()
                .find(|(prefix, _)| prompt.starts_with(prefix))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| {
                    Completion::Failed(CompletionFailure::Transport("no script".to_string()))
                })
        }
    }

    fn temp_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn listing(id: i64) -> Listing {
        Listing {
            id,
            title: "Test Hotel".to_string(),
            description: "Nice hotel".to_string(),
            location: "Downtown".to_string(),
            room_type: "Suite".to_string(),
            price: "200".to_string(),
        }
    }

    fn text(s: &str) -> Completion {
        Completion::Text(s.to_string())
    }

    #[tokio::test]
    async fn duplicate_ids_are_stored_once() {
        let source = Scripted::new(vec![
            ("Assign a rating", text("Rating: 4.2")),
            ("Generate a detailed review", text("Great property, highly recommend it!")),
        ]);
        let (_dir, storage) = temp_storage();
        let job = RatingReviewJob::new(&source);

        let (report, seen) = run_pass(&job, &[listing(1), listing(1)], SeenIds::new(), &storage)
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.fallbacks, 0);
        assert!(seen.contains(&1));
        assert_eq!(source.calls(), 2);
        assert_eq!(storage.rating_reviews().unwrap().len(), 1);

        let stored = &storage.rating_reviews().unwrap()[0];
        assert_eq!(stored.rating.to_string(), "4.2");
        assert_eq!(stored.review, "Great property, highly recommend it!");
    }

    #[tokio::test]
    async fn seen_set_carries_across_passes() {
        let source = Scripted::new(vec![("Generate a summary", text("Short summary"))]);
        let (_dir, storage) = temp_storage();
        let job = SummaryJob::new(&source);

        let (_, seen) = run_pass(&job, &[listing(1), listing(2)], SeenIds::new(), &storage)
            .await
            .unwrap();
        let (report, seen) = run_pass(&job, &[listing(2), listing(3)], seen, &storage)
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(seen.len(), 3);
        assert_eq!(storage.summaries().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unreadable_rating_stores_fallback_and_counts_it() {
        let source = Scripted::new(vec![
            ("Assign a rating", text("The rating is excellent")),
            ("Generate a detailed review", text("Lovely. Rating: 4 stars")),
        ]);
        let (_dir, storage) = temp_storage();

        let (report, _) = run_pass(
            &RatingReviewJob::new(&source),
            &[listing(1)],
            SeenIds::new(),
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(report.fallbacks, 1);
        let stored = &storage.rating_reviews().unwrap()[0];
        assert_eq!(stored.rating.to_string(), "4.5");
        assert_eq!(stored.review, "Lovely.");
    }

    #[tokio::test]
    async fn oversized_rating_aborts_the_pass() {
        let source = Scripted::new(vec![
            ("Assign a rating", text("Rating: 100.5")),
            ("Generate a detailed review", text("Fine")),
        ]);
        let (_dir, storage) = temp_storage();

        let err = run_pass(
            &RatingReviewJob::new(&source),
            &[listing(9), listing(10)],
            SeenIds::new(),
            &storage,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, JobError::Storage { property_id: 9, .. }));
        assert!(storage.rating_reviews().unwrap().is_empty());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn rewrite_truncates_title_at_call_site() {
        let long_title = "Sunny ".repeat(40);
        let reply = format!("{}Description: Bright and airy", long_title);
        let source = Scripted::new(vec![("Rewrite the following", Completion::Text(reply))]);
        let (_dir, storage) = temp_storage();

        run_pass(
            &RewriteJob::new(&source, 150),
            &[listing(1)],
            SeenIds::new(),
            &storage,
        )
        .await
        .unwrap();

        let stored = &storage.rewrites().unwrap()[0];
        assert_eq!(stored.title.chars().count(), 150);
        assert_eq!(stored.description, "Bright and airy");
    }

    #[tokio::test]
    async fn failed_rewrite_stores_original_pair() {
        let source = Scripted::new(vec![]);
        let (_dir, storage) = temp_storage();

        let (report, _) = run_pass(
            &RewriteJob::new(&source, 150),
            &[listing(1)],
            SeenIds::new(),
            &storage,
        )
        .await
        .unwrap();

        assert_eq!(report.fallbacks, 1);
        let stored = &storage.rewrites().unwrap()[0];
        assert_eq!(stored.title, "Test Hotel");
        assert_eq!(stored.description, "Nice hotel");
    }
}

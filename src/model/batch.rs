//! Batch growth-model fitting across many animals.
//!
//! Animals are split into fixed-size chunks that are fitted independently on
//! the rayon pool. Each chunk owns its intermediate state, so chunks can run
//! in any order; results are reassembled in input order.

use crate::data::AnimalRecord;
use crate::error::{QcError, Result};
use crate::model::growth::{fit_growth_model, GrowthModel};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Progress is reported after this many animals within a chunk.
pub const PROGRESS_INTERVAL: usize = 10;

/// Configuration for batch fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Number of animals per chunk.
    pub batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

/// Progress event emitted while a batch is running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Zero-based index of the chunk reporting.
    pub batch_index: usize,
    /// Total number of chunks.
    pub total_batches: usize,
    /// Percent of this chunk completed.
    pub batch_progress: f64,
    /// Percent of all animals completed.
    pub overall_progress: f64,
}

/// Growth fit for one animal within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalGrowth {
    /// Animal identifier.
    pub animal_id: String,
    /// Group label.
    pub group: String,
    /// Fitted model, absent when the animal could not be processed.
    pub model: Option<GrowthModel>,
    /// Doubling time derived from the model.
    pub doubling_time: Option<f64>,
    /// Why the animal could not be processed.
    pub error: Option<String>,
}

impl AnimalGrowth {
    /// Whether a non-degenerate model was fitted.
    pub fn has_valid_model(&self) -> bool {
        self.model.as_ref().is_some_and(|m| m.is_valid())
    }

    /// Fitted growth rate of a valid model.
    pub fn growth_rate(&self) -> Option<f64> {
        self.model
            .as_ref()
            .filter(|m| m.is_valid())
            .map(|m| m.r)
    }
}

/// Run statistics for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of animals submitted.
    pub total_animals: usize,
    /// Number of non-degenerate models.
    pub valid_models: usize,
    /// Wall-clock time in seconds.
    pub processing_time: f64,
    /// Number of chunks processed.
    pub batches_processed: usize,
}

/// Results of fitting a batch of animals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFit {
    /// Per-animal results in input order.
    pub animals: Vec<AnimalGrowth>,
    /// Run statistics.
    pub stats: BatchStats,
}

impl BatchFit {
    /// Get the result for a specific animal.
    pub fn get_animal(&self, animal_id: &str) -> Option<&AnimalGrowth> {
        self.animals.iter().find(|a| a.animal_id == animal_id)
    }

    /// Number of animals that failed outright.
    pub fn n_failed(&self) -> usize {
        self.animals.iter().filter(|a| a.model.is_none()).count()
    }
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Batch Growth Fit")?;
        writeln!(f, "  Animals:      {}", self.total_animals)?;
        writeln!(f, "  Valid models: {}", self.valid_models)?;
        writeln!(f, "  Batches:      {}", self.batches_processed)?;
        writeln!(f, "  Time:         {:.3}s", self.processing_time)?;
        Ok(())
    }
}

/// Fit growth models for many animals without progress reporting.
pub fn fit_growth_model_batch(animals: &[AnimalRecord], options: &BatchOptions) -> Result<BatchFit> {
    fit_growth_model_batch_with_progress(animals, options, |_| {})
}

/// Fit growth models for many animals, reporting progress.
///
/// `progress` is called from worker threads every [`PROGRESS_INTERVAL`]
/// animals and when a chunk completes; events from different chunks may
/// interleave. A malformed animal never aborts the batch: its result carries
/// the error and no model.
///
/// # Errors
/// [`QcError::InvalidParameter`] if `batch_size` is zero.
pub fn fit_growth_model_batch_with_progress<F>(
    animals: &[AnimalRecord],
    options: &BatchOptions,
    progress: F,
) -> Result<BatchFit>
where
    F: Fn(BatchProgress) + Sync,
{
    if options.batch_size == 0 {
        return Err(QcError::InvalidParameter(
            "Batch size must be positive".to_string(),
        ));
    }

    let start = Instant::now();
    let total = animals.len();
    let total_batches = total.div_ceil(options.batch_size);
    let completed = AtomicUsize::new(0);

    let chunks: Vec<Vec<AnimalGrowth>> = animals
        .par_chunks(options.batch_size)
        .enumerate()
        .map(|(batch_index, chunk)| {
            let mut results = Vec::with_capacity(chunk.len());
            for (i, animal) in chunk.iter().enumerate() {
                results.push(fit_animal(animal));

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                let in_chunk = i + 1;
                if in_chunk % PROGRESS_INTERVAL == 0 || in_chunk == chunk.len() {
                    progress(BatchProgress {
                        batch_index,
                        total_batches,
                        batch_progress: in_chunk as f64 / chunk.len() as f64 * 100.0,
                        overall_progress: done as f64 / total as f64 * 100.0,
                    });
                }
            }
            results
        })
        .collect();

    let results: Vec<AnimalGrowth> = chunks.into_iter().flatten().collect();
    let valid_models = results.iter().filter(|a| a.has_valid_model()).count();

    debug!(
        total_animals = total,
        valid_models, total_batches, "batch growth fit complete"
    );

    Ok(BatchFit {
        animals: results,
        stats: BatchStats {
            total_animals: total,
            valid_models,
            processing_time: start.elapsed().as_secs_f64(),
            batches_processed: total_batches,
        },
    })
}

fn fit_animal(animal: &AnimalRecord) -> AnimalGrowth {
    match fit_growth_model(&animal.time_points, &animal.measurements) {
        Ok(model) => AnimalGrowth {
            animal_id: animal.id.clone(),
            group: animal.group.clone(),
            doubling_time: model.doubling_time(),
            model: Some(model),
            error: None,
        },
        Err(e) => {
            warn!(animal = %animal.id, error = %e, "growth fit failed");
            AnimalGrowth {
                animal_id: animal.id.clone(),
                group: animal.group.clone(),
                model: None,
                doubling_time: None,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn growing_animal(id: usize, rate: f64) -> AnimalRecord {
        let days = vec![0.0, 4.0, 8.0, 12.0];
        let values = days.iter().map(|t| 100.0 * (rate * t).exp()).collect();
        AnimalRecord::new(format!("M{}", id), "vehicle", days, values)
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let mut animals: Vec<AnimalRecord> = (0..25).map(|i| growing_animal(i, 0.1)).collect();
        // Malformed: mismatched lengths.
        animals[7].measurements.pop();
        // Degenerate: too few positive points.
        animals[12].measurements = vec![100.0, 0.0, 0.0, 0.0];

        let fit = fit_growth_model_batch(&animals, &BatchOptions { batch_size: 4 }).unwrap();

        assert_eq!(fit.animals.len(), 25);
        for (i, result) in fit.animals.iter().enumerate() {
            assert_eq!(result.animal_id, format!("M{}", i));
        }
        assert!(fit.animals[7].model.is_none());
        assert!(fit.animals[7].error.is_some());
        assert!(fit.animals[7].doubling_time.is_none());
        assert!(fit.animals[12].model.is_some());
        assert!(!fit.animals[12].has_valid_model());
        assert_eq!(fit.stats.total_animals, 25);
        assert_eq!(fit.stats.valid_models, 23);
        assert_eq!(fit.stats.batches_processed, 7);
        assert_eq!(fit.n_failed(), 1);
        assert!(fit.animals[0].doubling_time.is_some());
    }

    #[test]
    fn test_progress_events() {
        let animals: Vec<AnimalRecord> = (0..25).map(|i| growing_animal(i, 0.05)).collect();
        let events = Mutex::new(Vec::new());

        fit_growth_model_batch_with_progress(&animals, &BatchOptions { batch_size: 20 }, |p| {
            events.lock().unwrap().push(p);
        })
        .unwrap();

        let events = events.into_inner().unwrap();
        // Chunk 0 (20 animals): at 10 and 20. Chunk 1 (5 animals): at 5.
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.total_batches == 2));
        assert!(events
            .iter()
            .any(|e| e.batch_index == 1 && (e.batch_progress - 100.0).abs() < 1e-9));
        let max_overall = events
            .iter()
            .map(|e| e.overall_progress)
            .fold(0.0, f64::max);
        assert!((max_overall - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_batch() {
        let fit = fit_growth_model_batch(&[], &BatchOptions::default()).unwrap();
        assert!(fit.animals.is_empty());
        assert_eq!(fit.stats.batches_processed, 0);
    }

    #[test]
    fn test_zero_batch_size() {
        assert!(fit_growth_model_batch(&[], &BatchOptions { batch_size: 0 }).is_err());
    }
}

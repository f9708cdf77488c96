use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CacheMode, HarnessConfig, RunConfiguration, SweepConfig};
use crate::issuer::RequestIssuer;
use crate::prelude::*;
use crate::runner::RunCoordinator;
use crate::writer::{ResultWriter, result_file_name};

/// One (probability, cache mode) pair of the experiment matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweepCell {
    pub probability: u8,
    pub cache_mode: CacheMode,
}

impl SweepCell {
    pub fn file_name(&self) -> String {
        result_file_name(self.cache_mode, self.probability)
    }
}

impl fmt::Display for SweepCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{} {}", self.probability, self.cache_mode)
    }
}

impl SweepConfig {
    /// Probabilities in configured order, each crossed with every cache mode.
    pub fn cells(&self) -> Vec<SweepCell> {
        self.probabilities
            .iter()
            .flat_map(|&probability| {
                self.cache_modes.iter().map(move |&cache_mode| SweepCell {
                    probability,
                    cache_mode,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CellOutcome {
    pub cell: SweepCell,
    pub get_samples: usize,
    pub post_samples: usize,
    pub failures: u64,
    /// Path of the written file, or why it could not be written.
    pub written: std::result::Result<PathBuf, String>,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub cells: Vec<CellOutcome>,
}

impl SweepReport {
    pub fn unwritten_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.written.is_err()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.unwritten_cells() == 0
    }

    /// Request failures only thin out the samples; the sweep fails only when
    /// a result file is missing.
    pub fn ensure_complete(&self) -> Result<()> {
        match self.unwritten_cells() {
            0 => Ok(()),
            n => Err(Error::IncompleteSweep(n)),
        }
    }
}

/// Runs every cell sequentially and persists each result as soon as its run
/// finishes. Each cell gets a fresh issuer from `make_issuer` so no
/// connection state carries over between cells. A cell whose file cannot be
/// written is reported and skipped.
pub async fn run_sweep<M, F>(
    config: &HarnessConfig,
    mut make_issuer: M,
    writer: &ResultWriter,
    mut on_progress: Option<F>,
) -> Result<SweepReport>
where
    M: FnMut() -> Result<Arc<dyn RequestIssuer>>,
    F: FnMut(&CellOutcome),
{
    let runs: Vec<(SweepCell, RunConfiguration)> = config
        .sweep
        .cells()
        .into_iter()
        .map(|cell| {
            config
                .run_configuration(cell.probability, cell.cache_mode)
                .map(|run_config| (cell, run_config))
        })
        .collect::<Result<_>>()?;

    info!(
        "Sweeping {} cells against {} ({} clients x {} requests)",
        runs.len(),
        config.target.base_url,
        config.run.workers,
        config.run.requests_per_worker
    );

    let mut report = SweepReport::default();
    for (cell, run_config) in runs {
        let coordinator = RunCoordinator::new(config.target.clone(), make_issuer()?, config.run.seed);
        let merged = coordinator.run(run_config).await;

        let written = match writer.write(&merged) {
            Ok(path) => {
                info!("Saved to {}", path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Failed to write results for {}: {}", cell, e);
                Err(e.to_string())
            }
        };

        let outcome = CellOutcome {
            cell,
            get_samples: merged.get_samples.len(),
            post_samples: merged.post_samples.len(),
            failures: merged.get_failures + merged.post_failures,
            written,
        };
        if let Some(ref mut cb) = on_progress {
            cb(&outcome);
        }
        report.cells.push(outcome);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedLatencyIssuer;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn harness_config(output_dir: PathBuf, probabilities: Vec<u8>) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.output_dir = output_dir;
        config.sweep.probabilities = probabilities;
        config
    }

    fn shared(issuer: &Arc<FixedLatencyIssuer>) -> impl FnMut() -> Result<Arc<dyn RequestIssuer>> + '_ {
        move || Ok(issuer.clone() as Arc<dyn RequestIssuer>)
    }

    fn line_count(path: &std::path::Path) -> usize {
        fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn cells_cross_probabilities_with_cache_modes() {
        let cells = SweepConfig::default().cells();
        assert_eq!(cells.len(), 10);
        assert_eq!(
            cells[0],
            SweepCell {
                probability: 0,
                cache_mode: CacheMode::Enabled
            }
        );
        assert_eq!(
            cells[1],
            SweepCell {
                probability: 0,
                cache_mode: CacheMode::Disabled
            }
        );
        assert_eq!(cells[9].file_name(), "latency_nocache_p80.csv");
    }

    #[tokio::test]
    async fn writes_one_file_per_cell() {
        let dir = tempdir().unwrap();
        let config = harness_config(dir.path().to_path_buf(), vec![0, 100]);
        let issuer = Arc::new(FixedLatencyIssuer::new(Duration::from_millis(10)));
        let writer = ResultWriter::new(&config.output_dir);
        let mut seen = Vec::new();

        let report = run_sweep(
            &config,
            shared(&issuer),
            &writer,
            Some(|outcome: &CellOutcome| seen.push(outcome.cell)),
        )
        .await
        .unwrap();

        assert!(report.is_complete());
        assert_eq!(seen.len(), 4);

        let p0 = dir.path().join("latency_cache_p0.csv");
        assert_eq!(line_count(&p0), 501);
        let content = fs::read_to_string(&p0).unwrap();
        assert!(!content.contains("POST"));

        let p100 = dir.path().join("latency_nocache_p100.csv");
        let content = fs::read_to_string(&p100).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("GET,")).count(), 500);
        assert_eq!(content.lines().filter(|l| l.starts_with("POST,")).count(), 500);
    }

    #[tokio::test]
    async fn every_cell_gets_a_fresh_issuer() {
        let dir = tempdir().unwrap();
        let config = harness_config(dir.path().to_path_buf(), vec![0, 40, 80]);
        let writer = ResultWriter::new(&config.output_dir);
        let mut built = Vec::new();

        run_sweep(
            &config,
            || {
                let issuer = Arc::new(FixedLatencyIssuer::new(Duration::from_millis(1)));
                built.push(issuer.clone());
                Ok(issuer as Arc<dyn RequestIssuer>)
            },
            &writer,
            None::<fn(&CellOutcome)>,
        )
        .await
        .unwrap();

        assert_eq!(built.len(), 6);
        // Each issuer served exactly one cell's GETs.
        assert!(built.iter().all(|issuer| issuer.get_calls() == 500));
    }

    #[tokio::test]
    async fn failing_target_still_completes_with_header_only_files() {
        let dir = tempdir().unwrap();
        let config = harness_config(dir.path().to_path_buf(), vec![20]);
        let issuer = Arc::new(FixedLatencyIssuer::failing());
        let writer = ResultWriter::new(&config.output_dir);

        let report = run_sweep(&config, shared(&issuer), &writer, None::<fn(&CellOutcome)>)
            .await
            .unwrap();

        assert!(report.is_complete());
        report.ensure_complete().unwrap();
        for outcome in &report.cells {
            assert_eq!(outcome.get_samples, 0);
            assert_eq!(outcome.post_samples, 0);
            assert!(outcome.failures >= 500);
        }
        for name in ["latency_cache_p20.csv", "latency_nocache_p20.csv"] {
            assert_eq!(fs::read_to_string(dir.path().join(name)).unwrap(), "type,latency\n");
        }
    }

    #[tokio::test]
    async fn unwritable_output_is_reported_per_cell() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("results");
        fs::write(&blocker, "x").unwrap();
        let config = harness_config(blocker.clone(), vec![0]);
        let issuer = Arc::new(FixedLatencyIssuer::new(Duration::from_millis(1)));
        let writer = ResultWriter::new(&blocker);

        let report = run_sweep(&config, shared(&issuer), &writer, None::<fn(&CellOutcome)>)
            .await
            .unwrap();

        assert_eq!(report.unwritten_cells(), 2);
        assert!(!report.is_complete());
        assert!(matches!(report.ensure_complete(), Err(Error::IncompleteSweep(2))));
    }

    #[tokio::test]
    async fn invalid_matrix_is_rejected_before_running() {
        let dir = tempdir().unwrap();
        let config = harness_config(dir.path().to_path_buf(), vec![0, 150]);
        let issuer = Arc::new(FixedLatencyIssuer::new(Duration::from_millis(1)));
        let writer = ResultWriter::new(dir.path());

        let result = run_sweep(&config, shared(&issuer), &writer, None::<fn(&CellOutcome)>).await;

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert_eq!(issuer.get_calls(), 0);
    }
}

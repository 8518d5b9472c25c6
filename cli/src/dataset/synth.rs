use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::DatasetError;

#[derive(Debug, Clone, Copy)]
pub struct SynthConfig {
    pub samples: usize,
    pub seed: u64,
    /// A row is labeled positive when its yes-count exceeds this.
    pub yes_threshold: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            samples: 2000,
            seed: 42,
            yes_threshold: 15,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SynthStats {
    pub rows: usize,
    pub positives: usize,
}

/// Writes a synthetic questionnaire CSV: one column per question (exact
/// question text as header), a terminal `label` column, uniform 0/1 cells
/// from a seeded RNG. The labeling rule matches the one the tabular
/// classifiers are trained against.
pub fn generate_csv(
    path: &Path,
    questions: &[&str],
    config: SynthConfig,
) -> Result<SynthStats, DatasetError> {
    let file = File::create(path).map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
    let mut writer = BufWriter::new(file);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    writeln!(writer, "{},label", questions.join(","))
        .map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;

    let mut stats = SynthStats::default();
    for _ in 0..config.samples {
        let row: Vec<u8> = (0..questions.len())
            .map(|_| rng.random_range(0..=1))
            .collect();
        let yes_count = row.iter().filter(|&&v| v == 1).count();
        let label = u8::from(yes_count > config.yes_threshold);
        if label == 1 {
            stats.positives += 1;
        }

        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{},{label}", cells.join(","))
            .map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
        stats.rows += 1;
    }
    writer
        .flush()
        .map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;

    Ok(stats)
}

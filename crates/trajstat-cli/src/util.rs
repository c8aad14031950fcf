use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use log::{info, warn};
use trajstat_analysis::{bootstrap::ValidationRun, run::Run};

const CSV_EXTENSION: &str = ".csv";

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)?;
        info!("Results written to {}", output.display_path());
        Ok(())
    }

    fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// CSV files of one experiment, identified by one or more names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentFiles {
    pub names: Vec<String>,
    pub files: Vec<PathBuf>,
}

impl ExperimentFiles {
    pub fn name(&self) -> &str {
        &self.names[0]
    }
}

/// Splits positional arguments of the form `<NAME>... <FILE>.csv... <NAME>... <FILE>.csv...`
///
/// Every experiment is described by exactly `name_len` names followed by at
/// least one CSV file.
pub fn group_experiment_args(
    args: &[String],
    name_len: usize,
) -> anyhow::Result<Vec<ExperimentFiles>> {
    assert!(name_len > 0, "experiments need at least one name");

    let mut groups = Vec::<ExperimentFiles>::new();
    for arg in args {
        let is_file = arg.ends_with(CSV_EXTENSION);
        match groups.last_mut() {
            Some(group) if !is_file && group.names.len() < name_len => {
                group.names.push(arg.clone());
            }
            Some(group) if !is_file && group.files.is_empty() => {
                bail!(
                    "You need at least one {CSV_EXTENSION} file per experiment, {} has none",
                    group.names.join(" ")
                );
            }
            Some(group) if is_file && group.names.len() == name_len => {
                group.files.push(PathBuf::from(arg));
            }
            Some(group) if is_file => {
                bail!(
                    "{arg} follows incomplete experiment name {}: expected {name_len} name(s)",
                    group.names.join(" ")
                );
            }
            None if is_file => bail!("{arg} is given before any experiment name"),
            _ => groups.push(ExperimentFiles {
                names: vec![arg.clone()],
                files: vec![],
            }),
        }
    }

    if let Some(group) = groups.last()
        && group.files.is_empty()
    {
        bail!(
            "You need at least one {CSV_EXTENSION} file per experiment, {} has none",
            group.names.join(" ")
        );
    }
    if groups.is_empty() {
        bail!("No experiments given");
    }
    Ok(groups)
}

/// Reads the selected columns of a CSV file with a header row
///
/// Column 0 is the elapsed time; rows with a negative time are skipped.
pub fn read_csv_columns<R>(
    reader: R,
    source: &str,
    columns: &[usize],
) -> anyhow::Result<Vec<Vec<f64>>>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut result = vec![vec![]; columns.len()];
    let mut skipped = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row from {source}"))?;
        // header is line 1
        let line = row + 2;
        let parse = |column: usize| -> anyhow::Result<f64> {
            let field = record
                .get(column)
                .with_context(|| format!("{source}:{line}: missing column {column}"))?;
            field
                .trim_matches(|c| c == '"' || c == '\'')
                .parse::<f64>()
                .with_context(|| {
                    format!("{source}:{line}: invalid number in column {column}: {field}")
                })
        };

        if parse(0)? < 0.0 {
            skipped += 1;
            continue;
        }
        for (values, &column) in result.iter_mut().zip(columns) {
            values.push(parse(column)?);
        }
    }
    if skipped > 0 {
        warn!("Found {skipped} time stamp(s) < 0 in {source}");
    }
    Ok(result)
}

fn open_csv(path: &Path) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))
}

/// Reads one run from a CSV file, taking time from column 0
pub fn read_run_file(path: &Path, value_column: usize) -> anyhow::Result<Run> {
    let source = path.display().to_string();
    let mut columns = read_csv_columns(open_csv(path)?, &source, &[0, value_column])?;
    let values = columns.pop().unwrap_or_default();
    let times = columns.pop().unwrap_or_default();
    Ok(Run::new(times, values))
}

/// Reads all runs of an experiment, skipping empty files
pub fn read_experiment_runs(
    experiment: &ExperimentFiles,
    value_column: usize,
) -> anyhow::Result<Vec<Run>> {
    let mut runs = Vec::with_capacity(experiment.files.len());
    for path in &experiment.files {
        let run = read_run_file(path, value_column)?;
        if run.is_empty() {
            warn!("Found empty file {}", path.display());
            continue;
        }
        runs.push(run);
    }
    info!(
        "{} contains {} run(s)",
        experiment.names.join(" "),
        runs.len()
    );
    Ok(runs)
}

/// Reads a run with train (column 1) and test (column 2) performance
pub fn read_validation_file(path: &Path) -> anyhow::Result<ValidationRun> {
    let source = path.display().to_string();
    let mut columns = read_csv_columns(open_csv(path)?, &source, &[0, 1, 2])?.into_iter();
    let (Some(times), Some(train), Some(test)) = (columns.next(), columns.next(), columns.next())
    else {
        bail!("{source}: expected time, train and test columns");
    };
    Ok(ValidationRun { times, train, test })
}

//! Dashform CLI - formula translation and dashboard tool

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use dashform::prelude::*;
use dashform::{evaluate_script, DashboardSpec};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dash")]
#[command(
    author,
    version,
    about = "Translate spreadsheet formulas and evaluate them over CSV data"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// References become whole-column accessors
    Column,
    /// References become one row's values
    Row,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a formula and print the resulting script
    Translate {
        /// Formula, e.g. "=SUM(B2:B)"
        formula: String,

        /// CSV file providing the column schema (and row values)
        #[arg(long)]
        csv: PathBuf,

        /// Evaluation mode
        #[arg(short, long, value_enum, default_value = "column")]
        mode: Mode,

        /// Data row for row mode (0-based)
        #[arg(short, long, default_value = "0")]
        row: usize,

        /// Also evaluate the translated script
        #[arg(short, long)]
        eval: bool,
    },

    /// Add derived columns and write the table as CSV
    Derive {
        /// Input CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Derived column as NAME=FORMULA (repeatable, applied in order)
        #[arg(short, long = "column", required = true)]
        columns: Vec<String>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate a KPI formula over a CSV file
    Kpi {
        /// Input CSV file
        #[arg(long)]
        csv: PathBuf,

        /// KPI formula, e.g. "=AVERAGE(B2:B)"
        #[arg(short, long)]
        formula: String,

        /// Display format (number, currency, percentage, decimal)
        #[arg(long = "format", default_value = "number")]
        format_type: String,
    },

    /// Print the column letter to name mapping as JSON
    Schema {
        /// Input CSV file
        #[arg(long)]
        csv: PathBuf,
    },

    /// Process a dashboard specification and print its configuration as JSON
    Dashboard {
        /// Input CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Dashboard specification (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Compute filter values and KPI display values from the data
        #[arg(short, long)]
        evaluate: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Translate {
            formula,
            csv,
            mode,
            row,
            eval,
        } => translate(&formula, &csv, mode, row, eval),
        Commands::Derive {
            csv,
            columns,
            output,
        } => derive(&csv, &columns, output.as_deref()),
        Commands::Kpi {
            csv,
            formula,
            format_type,
        } => kpi(&csv, &formula, &format_type),
        Commands::Schema { csv } => schema(&csv),
        Commands::Dashboard {
            csv,
            spec,
            evaluate,
        } => dashboard(&csv, &spec, evaluate),
    }
}

fn setup_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();
}

fn load(path: &Path) -> Result<Table> {
    CsvReader::read_file(path, &CsvReadOptions::default())
        .with_context(|| format!("Failed to load '{}'", path.display()))
}

fn translate(formula: &str, csv: &Path, mode: Mode, row: usize, eval: bool) -> Result<()> {
    let table = load(csv)?;
    let translator = FormulaTranslator::new();

    let script = match mode {
        Mode::Column => translator.translate_column(formula, table.schema()),
        Mode::Row => {
            let view = table
                .row(row)
                .with_context(|| format!("Row {} not found ({} rows)", row, table.row_count()))?;
            translator.translate_row(formula, view)
        }
    };
    println!("{}", script);

    if eval {
        let ctx = EvaluationContext::new(Some(&table));
        let value = evaluate_script(&script, &ctx)
            .with_context(|| format!("Failed to evaluate '{}'", script))?;
        println!("{}", value);
    }
    Ok(())
}

fn parse_column_arg(arg: &str) -> Result<TransformationSpec> {
    let Some((name, formula)) = arg.split_once('=') else {
        bail!("Expected NAME=FORMULA, got '{}'", arg);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing column name in '{}'", arg);
    }
    Ok(TransformationSpec {
        name: name.to_string(),
        formula: formula.trim().to_string(),
    })
}

fn derive(csv: &Path, columns: &[String], output: Option<&Path>) -> Result<()> {
    let specs = columns
        .iter()
        .map(|arg| parse_column_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    let mut table = load(csv)?;
    let derived = table
        .apply_transformations(&specs)
        .context("Failed to apply transformations")?;

    for column in &derived {
        if column.failed_rows > 0 {
            eprintln!(
                "Warning: {} rows of '{}' could not be computed",
                column.failed_rows, column.name
            );
        }
    }

    let options = CsvWriteOptions::default();
    match output {
        Some(path) => {
            CsvWriter::write_file(&table, path, &options)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("Wrote {} rows to '{}'", table.row_count(), path.display());
        }
        None => {
            let text = CsvWriter::write_string(&table, &options).context("Failed to render CSV")?;
            print!("{}", text);
        }
    }
    Ok(())
}

fn kpi(csv: &Path, formula: &str, format_type: &str) -> Result<()> {
    let table = load(csv)?;
    let spec = KpiSpec {
        name: "kpi".to_string(),
        fa_icon: String::new(),
        value_formula: formula.to_string(),
        format_type: format_type.to_string(),
        unit: String::new(),
    };
    let display = dashform::evaluate_kpi(&spec, &table)
        .with_context(|| format!("Failed to evaluate '{}'", formula))?;
    println!("{}", display);
    Ok(())
}

fn schema(csv: &Path) -> Result<()> {
    let table = load(csv)?;
    let json = serde_json::to_string_pretty(table.schema()).context("Failed to encode schema")?;
    println!("{}", json);
    Ok(())
}

fn dashboard(csv: &Path, spec_path: &Path, evaluate: bool) -> Result<()> {
    let text = std::fs::read_to_string(spec_path)
        .with_context(|| format!("Failed to read '{}'", spec_path.display()))?;
    let spec = DashboardSpec::from_json(&text)
        .with_context(|| format!("Failed to parse '{}'", spec_path.display()))?;

    let table = dashform::load_dashboard_table(csv, &spec)
        .with_context(|| format!("Failed to prepare '{}'", csv.display()))?;

    let processor = DashboardProcessor::new();
    let config = if evaluate {
        processor.process_table(&spec, &table)
    } else {
        processor.process(&spec, table.schema())
    };

    let json = serde_json::to_string_pretty(&config).context("Failed to encode configuration")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_arg() {
        let spec = parse_column_arg(r#"group=IF(B2>18,"adult","minor")"#).unwrap();
        assert_eq!(spec.name, "group");
        assert_eq!(spec.formula, r#"IF(B2>18,"adult","minor")"#);

        let spec = parse_column_arg("double = =A2*2").unwrap();
        assert_eq!(spec.name, "double");
        assert_eq!(spec.formula, "=A2*2");

        assert!(parse_column_arg("no separator").is_err());
        assert!(parse_column_arg("=A2").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from([
            "dash", "-vv", "derive", "--csv", "in.csv", "-c", "a==B2*2", "-c", "b=x",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Derive { columns, .. } => assert_eq!(columns, vec!["a==B2*2", "b=x"]),
            _ => panic!("expected derive"),
        }
    }
}

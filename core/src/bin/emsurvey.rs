use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use emsurvey_core::export::{report_file_name, write_report, CsvSink};
use emsurvey_core::{FileStore, SurveyConfig, SurveyError, SurveyStore};

#[derive(Parser)]
#[command(name = "emsurvey", version, about = "Inspect and export EM survey projects")]
struct Cli {
    /// Directory holding the project collection
    #[arg(long, default_value = ".")]
    store: PathBuf,

    /// Configuration file (defaults to <store>/emsurvey.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored projects
    List,
    /// Show a project's parameters and stations
    Show { index: usize },
    /// Write a project's report as CSV
    Export {
        index: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Advance a project to its next transect
    NewTransect { index: usize },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SurveyError> {
    let config_path = cli
        .config
        .unwrap_or_else(|| cli.store.join("emsurvey.toml"));
    let config = SurveyConfig::load(&config_path)?;
    let mut store = SurveyStore::with_key(FileStore::open(&cli.store)?, config.store_key.clone());

    match cli.command {
        Command::List => {
            let projects = store.load_all()?;
            if projects.is_empty() {
                println!("no saved projects");
            }
            for (index, project) in projects.iter().enumerate() {
                println!(
                    "{index:>3}  {:<30} stations: {:<4} resistivity: {} Ωm",
                    project.name,
                    project.station_count(),
                    project.common.average_resistivity
                );
            }
        }
        Command::Show { index } => {
            let project = store.get(index)?;
            let common = &project.common;
            println!("{}", project.name);
            println!("  transect:            {}", common.transcat);
            println!("  interstation (m):    {}", common.interstation);
            println!("  avg resistivity:     {} Ωm", common.average_resistivity);
            println!("  intercoil (m):       {}", common.intercoil);
            if let Some(gps) = &project.gps {
                println!("  gps:                 {:.6}, {:.6}", gps.latitude, gps.longitude);
            }
            println!("  next station:        {}", project.next_station());
            for (station, measurements) in &project.stations {
                println!("  station {station} ({} readings)", measurements.len());
                for m in measurements {
                    println!(
                        "    {:>4} Hz  depth {:>9.3} m  σ {:>10.3} µS/cm  ρ {:>10.3} Ωm",
                        m.frequency.hz(),
                        m.calculated_depth,
                        m.calculated_conductivity,
                        m.calculated_resistivity
                    );
                }
            }
        }
        Command::Export { index, out } => {
            let project = store.get(index)?;
            let path = out.unwrap_or_else(|| PathBuf::from(report_file_name(&project)));
            let mut sink = CsvSink::create(&path)?;
            let rows = write_report(&project, &mut sink)?;
            println!("wrote {rows} rows to {}", path.display());
        }
        Command::NewTransect { index } => {
            let mut project = store.get(index)?;
            let first = project.new_transect()?;
            store.replace_at(index, project)?;
            println!("project {index} continues at station {first}");
        }
    }
    Ok(())
}

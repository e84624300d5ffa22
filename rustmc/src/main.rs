use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use evocore::data::cluster::{Cluster, NPARAMS};
use evocore::data::filters::FilterSetName;
use evocore::data::star::StellarSystem;
use evocore::models::chab::ChabModel;
use evocore::models::grid::StellarModel;
use evocore::models::ifmr::IfmrModel;

use rustmc::chain::mass::MassChain;
use rustmc::chain::params::ParamChain;
use rustmc::chain::reader::{ChainReader, MagWindow};
use rustmc::chain::scatter::ScatterReader;
use rustmc::post::accumulate::accumulate_chain;
use rustmc::post::report::{write_debug_track, write_param_table, write_star_table};
use rustmc::settings::Settings;

/// Summarizes sampled MCMC chains for a stellar cluster and renders the
/// synthetic color-magnitude diagram at the posterior means.
#[derive(Parser, Debug)]
#[command(name = "make_cmd", version, about)]
struct Cli {
    /// Base path of the chain files; `.cluster`, `.mass1` and `.mass2` are
    /// appended to locate the inputs, `.cmd`, `.cluster.stat` and
    /// `.cmd.debug` to name the outputs.
    #[arg(short, long)]
    output: PathBuf,

    /// Scatter (observed photometry) file.
    #[arg(short, long)]
    scatter: PathBuf,

    /// Stellar model grid file.
    #[arg(short, long)]
    model: PathBuf,

    /// Optional JSON settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Brightest magnitude accepted in the reference filter.
    #[arg(long)]
    min_mag: Option<f64>,

    /// Faintest magnitude accepted in the reference filter.
    #[arg(long)]
    max_mag: Option<f64>,

    /// Reference filter index among the active filters (0-2).
    #[arg(long)]
    mag_index: Option<usize>,

    /// Upper precursor-mass bound for white dwarf formation.
    #[arg(long)]
    m_wd_up: Option<f64>,

    /// Cluster carbon abundance.
    #[arg(long)]
    carbonicity: Option<f64>,

    /// Initial-final mass relation (weidemann, williams, kalirai).
    #[arg(long)]
    ifmr: Option<String>,
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn open_input(path: &Path) -> anyhow::Result<BufReader<File>> {
    log::info!("reading file {}", path.display());
    let file =
        File::open(path).with_context(|| format!("file {} was not found", path.display()))?;
    Ok(BufReader::new(file))
}

fn parse_ifmr(name: &str) -> anyhow::Result<IfmrModel> {
    match name.to_ascii_lowercase().as_str() {
        "weidemann" => Ok(IfmrModel::Weidemann),
        "williams" => Ok(IfmrModel::Williams),
        "kalirai" => Ok(IfmrModel::Kalirai),
        other => anyhow::bail!("unknown initial-final mass relation: {other}"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("settings file {} is invalid", path.display()))?,
        None => Settings::default(),
    };
    if let Some(v) = cli.min_mag {
        settings.min_mag = v;
    }
    if let Some(v) = cli.max_mag {
        settings.max_mag = v;
    }
    if let Some(v) = cli.mag_index {
        settings.mag_index = v;
    }
    if let Some(v) = cli.m_wd_up {
        settings.m_wd_up = v;
    }
    if let Some(v) = cli.carbonicity {
        settings.carbonicity = v;
    }
    if let Some(name) = &cli.ifmr {
        settings.ifmr = parse_ifmr(name)?;
    }

    log::info!("loading model grid {}", cli.model.display());
    let model = ChabModel::load(&cli.model)
        .with_context(|| format!("model grid {} could not be loaded", cli.model.display()))?;
    anyhow::ensure!(
        model.is_supported(FilterSetName::UBVRIJHK),
        "model grid does not cover the {} filter set",
        FilterSetName::UBVRIJHK
    );

    let params = ParamChain::new(open_input(&with_suffix(&cli.output, ".cluster"))?)?;
    let primary_mass = MassChain::new(open_input(&with_suffix(&cli.output, ".mass1"))?)?;
    let secondary_mass = MassChain::new(open_input(&with_suffix(&cli.output, ".mass2"))?)?;
    let scatter = ScatterReader::new(open_input(&cli.scatter)?)?;
    let filters = scatter.filters().clone();

    let window = MagWindow::new(
        settings.min_mag,
        settings.max_mag,
        settings.mag_index,
        filters.len(),
    )?;
    let mut reader = ChainReader::new(params, primary_mass, secondary_mass, scatter, window)?;

    let n_stars = reader.star_count();
    log::info!("{} stars, {} active filters", n_stars, filters.len());
    let mut stars: Vec<StellarSystem> =
        (0..n_stars).map(|_| StellarSystem::new(filters.len())).collect();
    let mut cluster = Cluster::new(settings.m_wd_up, settings.carbonicity);

    let stats = accumulate_chain(&mut reader, &mut stars, &mut cluster, &model, &filters)?;
    anyhow::ensure!(stats.rows > 0, "no complete chain rows were read");

    // render everything at the posterior means
    for p in 0..NPARAMS {
        cluster.set_param(p, stats.params[p].mean());
    }

    let cmd_path = with_suffix(&cli.output, ".cmd");
    log::info!("writing file {}", cmd_path.display());
    let mut cmd = BufWriter::new(File::create(&cmd_path)?);
    write_star_table(
        &mut cmd,
        &stars,
        &stats,
        &cluster,
        &model,
        &filters,
        settings.ifmr,
    )?;

    let stat_path = with_suffix(&cli.output, ".cluster.stat");
    log::info!("writing file {}", stat_path.display());
    let mut stat = BufWriter::new(File::create(&stat_path)?);
    write_param_table(&mut stat, &stats)?;

    let debug_path = with_suffix(&cli.output, ".cmd.debug");
    log::info!("writing file {}", debug_path.display());
    let mut debug = BufWriter::new(File::create(&debug_path)?);
    write_debug_track(&mut debug, &cluster, &model, &filters)?;

    Ok(())
}

use std::path::PathBuf;
use std::process;

use clap::Parser;
use rails18xx_core::cli::{parse_sides, render_hex, render_upgrades};
use rails18xx_core::game::{BaseTokenLayType, GameSetup, LayTile, LayToken};
use rails18xx_core::types::RouteAlgorithm;
use rails18xx_core::upgrade::{sort_upgrades, tile_upgrades, token_upgrades};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser, Clone)]
#[command(name = "rails-upgrades")]
#[command(about = "List the tile and token lays a company can make on one hex")]
struct Args {
    /// Game configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Hex name, e.g. B4
    #[arg(long)]
    hex: String,

    /// Acting company id
    #[arg(long)]
    company: String,

    /// Current phase name
    #[arg(long)]
    phase: String,

    /// Sides of the hex reached by the company's network, e.g. 0,3 or N,SE
    #[arg(long, default_value = "")]
    connected: String,

    /// Override the configured connectivity rule
    #[arg(long)]
    algorithm: Option<RouteAlgorithm>,

    /// Also show candidates that are not offered on this hex
    #[arg(long)]
    all: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let setup = GameSetup::from_path(&args.config).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        process::exit(1);
    });
    let Some(hex) = setup.map.hex(&args.hex) else {
        eprintln!("Error: unknown hex '{}'", args.hex);
        process::exit(1);
    };
    let Some(company) = setup.company(&args.company) else {
        eprintln!("Error: unknown company '{}'", args.company);
        process::exit(1);
    };
    let Some(phase) = setup.phase(&args.phase) else {
        eprintln!("Error: unknown phase '{}'", args.phase);
        process::exit(1);
    };
    let algorithm = args.algorithm.unwrap_or(setup.route_algorithm);
    let connected = parse_sides(&args.connected, setup.map.orientation()).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        process::exit(1);
    });

    let lay_type = if company.is_home_hex(hex.id()) {
        BaseTokenLayType::HomeCity
    } else {
        BaseTokenLayType::Generic
    };
    let tile_action = LayTile::new(company.clone());
    let token_action = LayToken::base(company.clone(), lay_type);

    let mut upgrades = match tile_upgrades(
        &setup.map,
        &setup.tiles,
        hex.id(),
        &tile_action,
        phase,
        connected,
        algorithm,
    ) {
        Ok(upgrades) => upgrades,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };
    match token_upgrades(&setup.map, hex.id(), &token_action) {
        Ok(tokens) => upgrades.extend(tokens),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
    sort_upgrades(&mut upgrades);

    print!("{}", render_hex(&setup.map, hex));
    println!(
        "Candidates for {} in phase {} ({algorithm}, connected {}):",
        company.id, phase.name, connected
    );
    print!("{}", render_upgrades(&upgrades, args.all));
}

use clap::{Parser, Subcommand};
use glam::Vec3;
use tilescroll_terrain::HeightmapTerrain;
use tilescroll_tools::WorldInspector;
use tilescroll_world::{Direction, WorldConfig, WorldGrid};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilescroll-cli", about = "CLI tool for tilescroll world operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate version and a fresh world summary
    Info,
    /// Validate a heightmap and report mesh sizes per detail step
    Terrain {
        /// Heightmap image to load
        #[arg(long)]
        heightmap: String,
        /// Skip interval for the reduced mesh
        #[arg(short, long)]
        skip: Option<usize>,
    },
    /// Run a deterministic scripted walk and report world state
    Walk {
        /// Number of movement steps
        #[arg(short = 'n', long, default_value = "500")]
        steps: usize,
        /// Forest and walk-script seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// World configuration file (YAML)
        #[arg(long)]
        config: Option<String>,
        /// Print a summary every N steps
        #[arg(short, long, default_value = "100")]
        report_every: usize,
    },
}

const HEADINGS: [Direction; 8] = [
    Direction::Forward,
    Direction::ForwardLeft,
    Direction::Left,
    Direction::BackLeft,
    Direction::Back,
    Direction::BackRight,
    Direction::Right,
    Direction::ForwardRight,
];

fn scramble(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Info => {
            println!("tilescroll-cli v{}", env!("CARGO_PKG_VERSION"));

            let config = WorldConfig::default();
            println!(
                "defaults: start=({}, {}) scale={} speed={} recoil={} frames",
                config.player_start[0],
                config.player_start[1],
                config.player_scale,
                config.move_speed,
                config.recoil_frames
            );
            println!(
                "forest: seed={} trees={}..{} margin={}",
                config.forest.seed,
                config.forest.trees_min,
                config.forest.trees_max,
                config.forest.edge_margin
            );

            let world = WorldGrid::new(config);
            println!("{}", WorldInspector::summary(&world));
        }
        Commands::Terrain { heightmap, skip } => {
            let mut terrain = HeightmapTerrain::load(&heightmap)?;
            let raster = terrain.raster();
            println!(
                "Heightmap {heightmap}: {}x{} ({} samples)",
                raster.width(),
                raster.height(),
                raster.samples().len()
            );

            if let Some(skip) = skip {
                terrain.set_skip_interval(skip)?;
                println!("skip interval: {skip}");
            }
            for step in 1..=4u8 {
                match terrain.select_step(step) {
                    Ok(()) => {
                        let mesh = terrain.selected_mesh();
                        println!(
                            "step {step}: {} vertices, {} triangles ({}x{} grid)",
                            mesh.vertices.len(),
                            mesh.indices.len() / 3,
                            mesh.columns,
                            mesh.rows
                        );
                    }
                    Err(e) => println!("step {step}: refused ({e})"),
                }
            }
        }
        Commands::Walk {
            steps,
            seed,
            config,
            report_every,
        } => {
            println!("Scripted walk: seed={seed}, steps={steps}");

            let mut config = match &config {
                Some(path) => WorldConfig::from_yaml_file(path)?,
                None => WorldConfig::default(),
            };
            config.forest.seed = seed;
            let units = config.move_speed;
            let mut world = WorldGrid::new(config);

            // Fixed southward view; the script draws a heading and holds it
            // for a pseudo-random run so tile boundaries actually get crossed.
            let view = Vec3::NEG_Z;
            let mut state = seed;
            let mut heading = Direction::Forward;
            let mut run = 0usize;
            for step in 0..steps {
                if run == 0 {
                    state = scramble(state);
                    heading = HEADINGS[(state % 8) as usize];
                    run = 10 + (state >> 8) as usize % 31;
                }
                run -= 1;

                if !world.poll_recoil(view, Vec3::Y, units) {
                    world.move_player(heading, view, Vec3::Y, units);
                }
                world.check_position();

                if report_every > 0 && (step + 1) % report_every == 0 {
                    println!("[{:>5}] {}", step + 1, WorldInspector::summary(&world));
                }
            }

            let stats = world.stats();
            println!(
                "Walk complete: placed={} collisions={} recoil_frames={} recenters={}",
                stats.tiles_placed, stats.collisions, stats.recoil_frames, stats.recenters
            );
        }
    }

    Ok(())
}

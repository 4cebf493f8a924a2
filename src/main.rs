use clap::Parser;
use lightshot::mesh::MeshBuffers;
use lightshot::occlusion::OcclusionStrategy;
use lightshot::presets::ScenePreset;
use lightshot::preview::TopView;
use lightshot::scene::Scene;
use lightshot::solver::{BakeStats, PassObserver};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;

const DEFAULT_RESOLUTION: u32 = 16;

/// Bake multi-bounce lightmaps onto voxel terrain
#[derive(Parser, Debug)]
#[command(
    name = "lightshot",
    version,
    about = "A CPU-based photon tracer that bakes lightmaps onto procedural voxel terrain",
    after_help = "EXAMPLES:\n  \
                  lightshot 8\n  \
                  lightshot 32 --scene canyon --occlusion culled\n  \
                  lightshot --retransmission 0 --passes 1 --output direct.ppm"
)]
struct Cli {
    /// Samples per plate side; must be a power of two (falls back to 16)
    resolution: Option<u32>,

    /// Scene preset to bake
    #[arg(short, long, value_enum, default_value_t = ScenePreset::Terrain)]
    scene: ScenePreset,

    /// Grid cells along X
    #[arg(long)]
    width: Option<u32>,

    /// Grid cells along Y
    #[arg(long)]
    height: Option<u32>,

    /// Maximum number of propagation passes
    #[arg(short, long)]
    passes: Option<u32>,

    /// Fraction of received light each plate re-emits, in [0, 1]
    #[arg(short, long)]
    retransmission: Option<f64>,

    /// Seed of the heightfield generator
    #[arg(long)]
    depth_seed: Option<u64>,

    /// Seed of the connector tint generator
    #[arg(long)]
    tint_seed: Option<u64>,

    /// Occlusion test used during propagation
    #[arg(long, value_enum, default_value_t = CliOcclusion::Brute)]
    occlusion: CliOcclusion,

    /// Terminal pixels per grid cell in the preview (defaults to min(resolution, 8))
    #[arg(long)]
    cell_px: Option<u32>,

    /// Save every plate's lightmap as one PPM atlas
    #[arg(short, long)]
    output: Option<String>,

    /// Suppress the terminal preview
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOcclusion {
    /// Test every plate for every sample/photon pair
    Brute,
    /// Reject plates by bounding box before the exact test
    Culled,
}

impl From<CliOcclusion> for OcclusionStrategy {
    fn from(o: CliOcclusion) -> Self {
        match o {
            CliOcclusion::Brute => OcclusionStrategy::BruteForce,
            CliOcclusion::Culled => OcclusionStrategy::BoundsCulled,
        }
    }
}

fn resolve_resolution(requested: Option<u32>) -> u32 {
    match requested {
        Some(r) if r.is_power_of_two() => r,
        _ => {
            eprintln!(
                "  > no parameter, bad parameter, or value is not a power of two: using {DEFAULT_RESOLUTION}"
            );
            DEFAULT_RESOLUTION
        }
    }
}

// ─── Progress Reporter ──────────────────────────────────────────────────────

struct ProgressState {
    total: usize,
    done: usize,
    last_pct: usize,
    start: Instant,
}

/// Per-pass progress bar on stderr. Plates finish on worker threads, so the state sits
/// behind a mutex.
struct ProgressBar {
    state: Mutex<ProgressState>,
}

impl ProgressBar {
    const WIDTH: usize = 24;

    fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState {
                total: 1,
                done: 0,
                last_pct: 0,
                start: Instant::now(),
            }),
        }
    }
}

impl PassObserver for ProgressBar {
    fn pass_started(&self, _pass: u32, _max_passes: u32, _photons: usize, plates: usize) {
        if let Ok(mut s) = self.state.lock() {
            *s = ProgressState {
                total: plates.max(1),
                done: 0,
                last_pct: 0,
                start: Instant::now(),
            };
        }
    }

    fn plate_finished(&self) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        s.done += 1;
        let pct = s.done * 100 / s.total;
        if pct != s.last_pct {
            let elapsed = s.start.elapsed().as_secs_f64();
            let rate = s.done as f64 / elapsed.max(f64::EPSILON);
            let remaining = (s.total - s.done.min(s.total)) as f64 / rate;
            let filled = pct.min(100) * Self::WIDTH / 100;
            let bar = format!("{}{}", "█".repeat(filled), "░".repeat(Self::WIDTH - filled));
            eprint!("\r  Baking: │{bar}│ {pct:3}%  ETA {remaining:.0}s   ");
            s.last_pct = pct;
        }
    }

    fn pass_finished(&self, pass: u32, emitted: usize) {
        if let Ok(s) = self.state.lock() {
            let bar = "█".repeat(Self::WIDTH);
            eprintln!(
                "\r  Baking: │{bar}│ 100%  {:.2}s  pass {pass}, {emitted} photon(s) re-emitted",
                s.start.elapsed().as_secs_f64()
            );
        }
    }
}

fn print_header(name: &str, scene: &Scene, occlusion: OcclusionStrategy) {
    eprintln!();
    eprintln!("  [lightshot] a CPU-based photon tracer");
    eprintln!();
    eprintln!("  Scene:          {name} ({}x{} cells)", scene.width, scene.height);
    eprintln!("  Resolution:     {0}x{0}", scene.resolution);
    eprintln!("  Passes:         {}", scene.max_passes);
    eprintln!(
        "  Retransmission: {}%",
        (scene.retransmission * 100.0) as u32
    );
    eprintln!("  Occlusion:      {occlusion:?}");
    eprintln!();
}

fn print_summary(stats: &BakeStats, mesh: &MeshBuffers) {
    let fill = "━".repeat(30);
    eprintln!("  {fill}");
    eprintln!("  Time:     {:.2?}", stats.elapsed);
    eprintln!("  Passes:   {} ({:?})", stats.passes, stats.termination);
    eprintln!("  Photons:  {} total", stats.total_photons());
    eprintln!("  Plates:   {}", mesh.vertex_count() / 4);
    eprintln!(
        "  Mesh:     {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.indices.len() / 3
    );
    eprintln!("  {fill}");
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut scene = cli.scene.build();
    scene.resolution = resolve_resolution(cli.resolution);
    if let Some(passes) = cli.passes {
        scene.max_passes = passes;
    }
    if let Some(width) = cli.width {
        scene.width = width;
    }
    if let Some(height) = cli.height {
        scene.height = height;
    }
    if let Some(retransmission) = cli.retransmission {
        scene.retransmission = retransmission;
    }
    if let Some(seed) = cli.depth_seed {
        scene.depth_seed = seed;
    }
    if let Some(seed) = cli.tint_seed {
        scene.tint_seed = seed;
    }
    if let Err(e) = scene.validate() {
        eprintln!("  Error: {e}");
        return ExitCode::FAILURE;
    }

    let occlusion = OcclusionStrategy::from(cli.occlusion);
    print_header(cli.scene.name(), &scene, occlusion);

    let progress = ProgressBar::new();
    let bake = match lightshot::bake(&scene, occlusion, &progress) {
        Ok(bake) => bake,
        Err(e) => {
            eprintln!("  Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mesh = MeshBuffers::from_plates(&bake.plates);
    eprintln!();
    print_summary(&bake.stats, &mesh);
    eprintln!();

    if !cli.quiet {
        let cell_px = cli.cell_px.unwrap_or(scene.resolution.min(8));
        if let Some(view) = TopView::from_plates(&bake.plates, scene.resolution, cell_px) {
            if let Err(e) = view.display() {
                log::warn!("preview failed: {e}");
            }
        }
    }

    if let Some(ref path) = cli.output {
        let written = lightshot::lightmap::Atlas::pack(&bake.plates, scene.resolution)
            .and_then(|atlas| atlas.write_ppm(path));
        match written {
            Ok(()) => eprintln!("  Saved: {path}"),
            Err(e) => {
                eprintln!("  Error saving {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

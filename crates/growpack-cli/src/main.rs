use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use growpack_core::{
    AtlasBuilder, AtlasStats, BuilderConfig, DecodeError, DecodeResult, DuplicateKeyPolicy,
    PLACEHOLDER_SIZE, SortOrder, pack_layout, to_json_string,
};
use image::ImageReader;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "growpack",
    about = "Pack images into a single auto-sized texture atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Progress bar while decoding (`--progress false` to hide)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// More logging: -v debug, -vv trace
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Errors only; wins over -v
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into an atlas (PNG + JSON)
    Pack(PackArgs),
    /// Layout-only export (no PNG): read image sizes and export JSON placements
    Layout(PackArgs),
    /// Time one build of a directory and report occupancy
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Image file or directory to scan
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Directory for generated files
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name for `<name>.png` and `<name>.json`
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML file whose keys override the flags below
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Only keep files whose path matches one of these globs
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Drop files whose path matches one of these globs
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Sort order: height_desc|width_desc|area_desc|max_side_desc|none
    #[arg(long, default_value = "height_desc", help_heading = "Layout")]
    sort_order: String,
    /// Repeated keys: reject|keep_first|keep_last
    #[arg(long, default_value = "keep_last", help_heading = "Layout")]
    duplicates: String,
    /// Fail if the grown atlas is wider than this
    #[arg(long, help_heading = "Layout")]
    max_width: Option<u32>,
    /// Fail if the grown atlas is taller than this
    #[arg(long, help_heading = "Layout")]
    max_height: Option<u32>,

    // Export
    /// Write atlas stats as JSON here
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the effective configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Format for --print-config
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Pack and report, but write nothing
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory
    input: PathBuf,
    /// Sort order: height_desc|width_desc|area_desc|max_side_desc|none
    #[arg(long, default_value = "height_desc")]
    sort_order: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => run_layout(args),
        Commands::Bench(b) => run_bench(b),
    }
}

fn resolve_config(cli: &PackArgs) -> anyhow::Result<BuilderConfig> {
    let cfg = BuilderConfig {
        sort_order: parse_sort_order(&cli.sort_order)?,
        duplicate_keys: parse_duplicates(&cli.duplicates)?,
        max_width: cli.max_width,
        max_height: cli.max_height,
        ..Default::default()
    };
    // Config file sets options en bloc on top of the CLI values
    let cfg = if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        y.into_builder_config(cfg)?
    } else {
        cfg
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Handles `--print-config`; returns true if the command should stop here.
fn print_config(cli: &PackArgs, cfg: &BuilderConfig) -> anyhow::Result<bool> {
    if !cli.print_config {
        return Ok(false);
    }
    match cli.print_config_format.as_str() {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(true)
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = resolve_config(cli)?;
    if print_config(cli, &cfg)? {
        return Ok(());
    }
    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    if paths.is_empty() {
        anyhow::bail!("no images found under {}", cli.input.display());
    }

    let bar = progress_bar(paths.len(), show_progress);
    let mut decode = |p: PathBuf| -> DecodeResult {
        if let Some(b) = &bar {
            b.set_message(
                p.file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("")
                    .to_string(),
            );
            b.inc(1);
        }
        load_image(&p)
    };
    let mut builder = AtlasBuilder::new(cfg.clone());
    builder.decode_all(paths.into_iter().map(|p| (path_key(&p), p)), &mut decode);
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    info!(count = builder.len(), "loaded input images");

    let atlas = builder.build()?;
    let stats = atlas.stats();
    log_stats(&stats);

    if !cli.dry_run {
        let png_path = cli.out_dir.join(format!("{}.png", cli.name));
        atlas
            .surface()
            .save(&png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, "wrote atlas image");

        let json_path = cli.out_dir.join(format!("{}.json", cli.name));
        let json = to_json_string(&atlas, cfg.sort_order)?;
        fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, sprites = atlas.len(), "atlas written");
    }
    export_stats(cli, &stats)
}

fn run_layout(cli: &PackArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(cli)?;
    if print_config(cli, &cfg)? {
        return Ok(());
    }
    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let mut items: Vec<(String, u32, u32)> = Vec::with_capacity(paths.len());
    for p in &paths {
        let (w, h) = match image::image_dimensions(p) {
            Ok((w, h)) if w > 0 && h > 0 => (w, h),
            Ok((w, h)) => {
                warn!(?p, w, h, "zero-sized image; reserving placeholder size");
                PLACEHOLDER_SIZE
            }
            Err(e) => {
                warn!(?p, error = %e, "unreadable image; reserving placeholder size");
                PLACEHOLDER_SIZE
            }
        };
        items.push((path_key(p), w, h));
    }

    let atlas = pack_layout(items, cfg.clone())?;
    let stats = atlas.stats();
    log_stats(&stats);

    if !cli.dry_run {
        let json_path = cli.out_dir.join(format!("{}.json", cli.name));
        let json = to_json_string(&atlas, cfg.sort_order)?;
        fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, sprites = atlas.len(), "atlas written (layout-only)");
    }
    export_stats(cli, &stats)
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    use std::time::Instant;
    let paths = gather_paths(&b.input, &[], &[])?;
    let cfg = BuilderConfig::builder()
        .sort_order(parse_sort_order(&b.sort_order)?)
        .build();
    let mut builder = AtlasBuilder::new(cfg);
    builder.decode_all(
        paths.into_iter().map(|p| (path_key(&p), p)),
        &mut |p: PathBuf| load_image(&p),
    );
    let start = Instant::now();
    let atlas = builder.build()?;
    let dur = start.elapsed();
    let stats = atlas.stats();
    println!(
        "size={}x{} sprites={} occupancy={:.2}% time={}",
        stats.width,
        stats.height,
        stats.num_sprites,
        stats.occupancy * 100.0,
        bench_fmt_dur(dur)
    );
    Ok(())
}

fn log_stats(stats: &AtlasStats) {
    info!(
        width = stats.width,
        height = stats.height,
        sprites = stats.num_sprites,
        placeholders = stats.num_placeholders,
        used_area = stats.used_area,
        atlas_area = stats.atlas_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );
}

fn export_stats(cli: &PackArgs, stats: &AtlasStats) -> anyhow::Result<()> {
    let Some(stats_path) = &cli.export_stats else {
        return Ok(());
    };
    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }
    fs::write(stats_path, serde_json::to_string_pretty(stats)?)
        .with_context(|| format!("write {}", stats_path.display()))?;
    info!(?stats_path, "stats exported");
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat:?}"))?);
    }
    Ok(Some(b.build()?))
}

/// Image files under `root` (or `root` itself), in file-name order, after glob filtering.
fn gather_paths(root: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let include = globset(include)?;
    let exclude = globset(exclude)?;
    let wanted = |p: &Path| {
        let key = path_key(p);
        has_image_ext(p)
            && !exclude.as_ref().is_some_and(|g| g.is_match(&key))
            && include.as_ref().is_none_or(|g| g.is_match(&key))
    };
    if root.is_file() {
        return Ok(if wanted(root) { vec![root.to_path_buf()] } else { Vec::new() });
    }
    Ok(WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && wanted(e.path()))
        .map(|e| e.into_path())
        .collect())
}

fn has_image_ext(p: &Path) -> bool {
    const EXTS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tga", "gif"];
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn path_key(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn progress_bar(len: usize, show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let b = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
    ) {
        b.set_style(style);
    }
    Some(b)
}

/// Decodes one file; failures are handed to the builder, which substitutes the placeholder.
fn load_image(p: &Path) -> DecodeResult {
    let img = ImageReader::open(p)
        .map_err(DecodeError::Io)?
        .with_guessed_format()
        .map_err(DecodeError::Io)?
        .decode()?;
    Ok(img.into_rgba8())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    sort_order: Option<String>,
    duplicate_keys: Option<String>,
    background_color: Option<[u8; 4]>,
    max_width: Option<u32>,
    max_height: Option<u32>,
}

impl YamlConfig {
    fn into_builder_config(self, mut cfg: BuilderConfig) -> anyhow::Result<BuilderConfig> {
        if let Some(v) = self.sort_order {
            cfg.sort_order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.duplicate_keys {
            cfg.duplicate_keys = parse_duplicates(&v)?;
        }
        if let Some(v) = self.background_color {
            cfg.background_color = v;
        }
        if let Some(v) = self.max_width {
            cfg.max_width = Some(v);
        }
        if let Some(v) = self.max_height {
            cfg.max_height = Some(v);
        }
        Ok(cfg)
    }
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

fn parse_duplicates(s: &str) -> anyhow::Result<DuplicateKeyPolicy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown duplicate-key policy: {}", s))
}

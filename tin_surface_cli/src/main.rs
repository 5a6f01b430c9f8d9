use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use tin_surface::{
    dtm::{ErrorStatistics, Histogram, HullWalk, SamplingGrid, MAX_SAMPLE_CELLS},
    io::{landxml, las, obj, InputFormat},
    lidar::ClassificationFilter,
    reporting, Result, TinConfig, TinSurface,
};

/// Build and query TIN surfaces from LAS, text or LandXML input.
#[derive(Parser)]
#[command(name = "tin_surface_cli", version)]
struct Cli {
    /// JSON configuration file; command line flags take precedence.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Walk {
    Flood,
    Peel,
}

impl From<Walk> for HullWalk {
    fn from(w: Walk) -> Self {
        match w {
            Walk::Flood => HullWalk::Flood,
            Walk::Peel => HullWalk::Peel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Las,
    Xyz,
    Landxml,
}

impl From<Format> for InputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Las => InputFormat::Las,
            Format::Xyz => InputFormat::Xyz,
            Format::Landxml => InputFormat::LandXml,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Quantity {
    /// Triangle slope in percent.
    Slope,
    /// Plan length of valid edges.
    EdgeLength,
    /// Plan area of valid triangles.
    Area,
    /// Angle between neighbouring triangles.
    CrossSlope,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a surface from a point cloud or LandXML file and save it.
    Build {
        input: PathBuf,
        output: PathBuf,
        /// Input format; taken from the extension when omitted.
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Number of retained points dropped between kept ones.
        #[arg(long)]
        stride: Option<usize>,
        /// Apply the stride after triangulating so hull points are kept.
        #[arg(long)]
        keep_hull: bool,
        /// Classification codes to keep, comma separated.
        #[arg(long, value_delimiter = ',')]
        classes: Vec<u8>,
        #[arg(long, value_enum)]
        walk: Option<Walk>,
        /// Skip hull pruning.
        #[arg(long)]
        no_prune: bool,
        /// Save the raw model without zip compression.
        #[arg(long)]
        no_compress: bool,
        /// Append error statistics of the decimated points to this CSV.
        #[arg(long)]
        errors_csv: Option<PathBuf>,
    },
    /// Print a summary of a saved surface.
    Info { model: PathBuf },
    /// Report elevation, slope and aspect at a point.
    Query { model: PathBuf, x: f64, y: f64 },
    /// Print surface statistics as JSON.
    Stats {
        model: PathBuf,
        /// Also write the statistics as name,value CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// LAS file of check points to compare against the surface.
        #[arg(long)]
        check: Option<PathBuf>,
        /// Append check point error statistics to this CSV.
        #[arg(long)]
        errors_csv: Option<PathBuf>,
    },
    /// Write a histogram of a surface quantity to CSV.
    Histogram {
        model: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum, default_value = "slope")]
        of: Quantity,
        #[arg(long, default_value_t = 20)]
        bins: usize,
    },
    /// Sample elevations on a regular grid and write x,y,z CSV.
    Sample {
        model: PathBuf,
        output: PathBuf,
        #[arg(long)]
        spacing: f64,
    },
    /// Export the surface as a LandXML TIN.
    ExportLandxml { model: PathBuf, output: PathBuf },
    /// Export the valid triangles as Wavefront OBJ.
    ExportObj {
        model: PathBuf,
        output: PathBuf,
        /// Move the bounding-box centre to the origin.
        #[arg(long)]
        translate: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<TinConfig> {
    match path {
        Some(p) => TinConfig::from_json_file(p),
        None => Ok(TinConfig::default()),
    }
}

fn fmt_opt(v: Option<f64>, unit: &str) -> String {
    v.map(|v| format!("{v:.3}{unit}"))
        .unwrap_or_else(|| "none".to_string())
}

fn run(cli: Cli) -> std::result::Result<(), Box<dyn Error>> {
    let mut config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Build {
            input,
            output,
            format,
            stride,
            keep_hull,
            classes,
            walk,
            no_prune,
            no_compress,
            errors_csv,
        } => {
            if let Some(stride) = stride {
                config.skip_stride = stride;
            }
            if !classes.is_empty() {
                config.classification_filter = ClassificationFilter::new(classes);
            }
            if let Some(walk) = walk {
                config.prune.walk = walk.into();
            }
            if keep_hull {
                config.keep_hull = true;
            }
            if no_compress {
                config.compress = false;
            }
            let format = format
                .map(InputFormat::from)
                .unwrap_or_else(|| InputFormat::from_path(&input));
            let surface = if no_prune {
                TinSurface::import(&input, format, &config)?
            } else {
                TinSurface::build_as(&input, format, &config)?
            };
            surface.save(&output, config.compress)?;
            println!("Built {} from {}", surface.size_summary(), input.display());
            if let Some(csv) = errors_csv {
                match surface.unused_point_errors() {
                    Some(e) => {
                        reporting::append_error_statistics_csv(&csv, &input.to_string_lossy(), &e)?;
                        println!("RMSE {:.3} over {} unused points", e.rmse, e.count);
                    }
                    None => println!("No unused points fell on the surface"),
                }
            }
        }
        Commands::Info { model } => {
            let surface = TinSurface::load(&model)?;
            let b = surface.bounding_box();
            println!("{}", surface.size_summary());
            println!(
                "Extent: {:.3},{:.3} to {:.3},{:.3}, z {:.3} to {:.3}",
                b.min_x, b.min_y, b.max_x, b.max_y, b.min_z, b.max_z
            );
            println!("Hull points: {}", surface.hull_point_indices().len());
            match surface.source() {
                Some(src) => {
                    println!("Source: {} (stride {})", src.display(), surface.skip_stride())
                }
                None => println!("Source: unknown"),
            }
        }
        Commands::Query { model, x, y } => {
            let surface = TinSurface::load(&model)?;
            let q = surface.query(x, y);
            if q.triangle.is_none() {
                println!("({x}, {y}) is outside the surface");
            } else {
                println!(
                    "Elevation: {}, Slope: {}, Aspect: {}",
                    fmt_opt(q.elevation, ""),
                    fmt_opt(q.slope, "%"),
                    fmt_opt(q.aspect, " deg")
                );
            }
        }
        Commands::Stats {
            model,
            csv,
            check,
            errors_csv,
        } => {
            let surface = TinSurface::load(&model)?;
            let stats = surface.statistics();
            println!("{}", serde_json::to_string_pretty(&stats)?);
            if let Some(csv) = csv {
                reporting::write_statistics_csv(&csv, &stats)?;
            }
            if let Some(check) = check {
                let points = las::read_points(&check, &config.classification_filter, 0)?;
                match ErrorStatistics::compute(&surface, &points) {
                    Some(e) => {
                        println!(
                            "Check points: {} on surface, {} missed, \
                             RMSE {:.3}, max {:.3}, p95 {:.3}",
                            e.count, e.missed, e.rmse, e.max, e.p95
                        );
                        if let Some(path) = errors_csv {
                            reporting::append_error_statistics_csv(
                                &path,
                                &check.to_string_lossy(),
                                &e,
                            )?;
                        }
                    }
                    None => println!("No check points fell on the surface"),
                }
            }
        }
        Commands::Histogram {
            model,
            output,
            of,
            bins,
        } => {
            let surface = TinSurface::load(&model)?;
            let values = match of {
                Quantity::Slope => surface.triangle_slopes(),
                Quantity::EdgeLength => surface.edge_lengths_2d(),
                Quantity::Area => surface
                    .valid_triangles()
                    .map(|t| t.plan_area(surface.points()))
                    .collect(),
                Quantity::CrossSlope => surface.edge_cross_slopes(),
            };
            let histogram = Histogram::from_values(&values, bins)
                .ok_or_else(|| format!("cannot bin {} values into {bins} bins", values.len()))?;
            reporting::write_histogram_csv(&output, &histogram)?;
            println!("Wrote {} values in {bins} bins to {}", histogram.total(), output.display());
        }
        Commands::Sample {
            model,
            output,
            spacing,
        } => {
            let surface = TinSurface::load(&model)?;
            let grid = SamplingGrid::new(surface.bounding_box(), spacing).ok_or_else(|| {
                format!(
                    "sample spacing must be positive and give at most \
                     {MAX_SAMPLE_CELLS} cells, got {spacing}"
                )
            })?;
            let values = grid.sample(&surface);
            reporting::write_samples_csv(&output, &grid, &values)?;
            let hits = values.iter().filter(|v| v.is_some()).count();
            println!(
                "Sampled {} of {} grid cells to {}",
                hits,
                grid.len(),
                output.display()
            );
        }
        Commands::ExportLandxml { model, output } => {
            let surface = TinSurface::load(&model)?;
            landxml::write_landxml(&output, &surface)?;
            println!("Exported {} to {}", surface.size_summary(), output.display());
        }
        Commands::ExportObj {
            model,
            output,
            translate,
        } => {
            let surface = TinSurface::load(&model)?;
            obj::write_obj(&output, &surface, translate)?;
            println!("Exported {} to {}", surface.size_summary(), output.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

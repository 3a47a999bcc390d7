// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshwright CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use meshwright::geometry::shapes;
use meshwright::modeling::{CADDesigner, QuadConversionOptions, QuadTools, RevolveOptions, SubD, SubdivisionOptions};
use meshwright::{analyze, ExtrudeOptions, GeometryKernel, KernelConfig, MeshBuffer, ObjectId, Shape, Vec3};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "meshwright")]
#[command(about = "Meshwright - half-edge mesh kernel and modeling operators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kernel configuration file (defaults to ./meshwright.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Square,
    Circle,
    Hexagon,
}

#[derive(Subcommand)]
enum Commands {
    /// Extrude a profile and append it to a scene file
    Extrude {
        /// Profile shape
        #[arg(long, value_enum, default_value = "square")]
        profile: Profile,

        /// Profile width or diameter
        #[arg(long, default_value = "1.0")]
        size: f64,

        /// Extrusion height
        #[arg(long, default_value = "1.0")]
        height: f64,

        /// Segments for circular profiles
        #[arg(long, default_value = "32")]
        segments: usize,

        /// Scene file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Revolve a rectangular profile about the Y axis and report the result
    Revolve {
        /// Distance from the axis to the profile's inner edge
        #[arg(long, default_value = "1.0")]
        radius: f64,

        /// Profile width and height
        #[arg(long, default_value = "0.5")]
        size: f64,

        /// Sweep angle in degrees
        #[arg(long, default_value = "360.0")]
        angle: f64,

        #[arg(long, default_value = "32")]
        segments: usize,

        /// Write the render buffer as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Catmull-Clark subdivide every solid in a scene file
    Subdivide {
        input: PathBuf,

        #[arg(short, long, default_value = "1")]
        levels: usize,

        /// Keep sharp edges sharp
        #[arg(long)]
        creases: bool,

        /// Convert to quads first
        #[arg(long)]
        quadify: bool,

        /// Write the subdivided render buffers as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print statistics for every object in a scene file
    Info { input: PathBuf },

    /// Export render buffers for every object in a scene file
    ExportBuffer {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Extrude {
            profile,
            size,
            height,
            segments,
            output,
        } => extrude_command(config, *profile, *size, *height, *segments, output, &cli),
        Commands::Revolve {
            radius,
            size,
            angle,
            segments,
            output,
        } => revolve_command(config, *radius, *size, *angle, *segments, output.as_deref(), &cli),
        Commands::Subdivide {
            input,
            levels,
            creases,
            quadify,
            output,
        } => subdivide_command(config, input, *levels, *creases, *quadify, output.as_deref(), &cli),
        Commands::Info { input } => info_command(config, input, &cli),
        Commands::ExportBuffer { input, output } => export_command(config, input, output, &cli),
        Commands::Version => {
            println!("Meshwright v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<KernelConfig> {
    match path {
        Some(path) => KernelConfig::from_file(path),
        None => KernelConfig::load(),
    }
}

fn load_scene(config: KernelConfig, input: &Path) -> Result<GeometryKernel> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    let mut kernel = GeometryKernel::with_config(config);
    kernel
        .load_from_file(input)
        .with_context(|| format!("Failed to load scene {}", input.display()))?;
    Ok(kernel)
}

fn extrude_command(
    config: KernelConfig,
    profile: Profile,
    size: f64,
    height: f64,
    segments: usize,
    output: &Path,
    cli: &Cli,
) -> Result<()> {
    let mut kernel = if output.exists() {
        load_scene(config, output)?
    } else {
        GeometryKernel::with_config(config)
    };

    let center = Vec3::zeros();
    let radius_point = Vec3::new(size * 0.5, 0.0, 0.0);
    let points = match profile {
        Profile::Square => shapes::rectangle(&center, size, size),
        Profile::Circle => shapes::circle(&center, &radius_point, segments),
        Profile::Hexagon => shapes::regular_polygon(&center, &radius_point, 6),
    };
    let curve = kernel.add_curve(&points).context("Failed to build profile")?;
    let solid = kernel
        .extrude_curve(curve, height, ExtrudeOptions::default())
        .context("Extrusion failed")?;
    kernel.delete_object(curve);

    kernel
        .save_to_file(output)
        .with_context(|| format!("Failed to write scene {}", output.display()))?;

    let stats = analyze(kernel.solid(solid)?.mesh());
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{} {} {}", "✓".green(), "Extruded".bold(), solid);
        println!("  {}", stats.summary().bright_black());
        println!("  {} {}", "Scene:".bright_black(), output.display().to_string().cyan());
    }
    Ok(())
}

fn revolve_command(
    config: KernelConfig,
    radius: f64,
    size: f64,
    angle: f64,
    segments: usize,
    output: Option<&Path>,
    cli: &Cli,
) -> Result<()> {
    let mut kernel = GeometryKernel::with_config(config);
    let inner = radius;
    let outer = radius + size;
    let profile = [
        Vec3::new(inner, 0.0, 0.0),
        Vec3::new(outer, 0.0, 0.0),
        Vec3::new(outer, size, 0.0),
        Vec3::new(inner, size, 0.0),
    ];
    let curve = kernel.add_curve(&profile).context("Failed to build profile")?;
    let options = RevolveOptions {
        angle_degrees: angle,
        segments,
        ..Default::default()
    };
    let solid = CADDesigner::new(&mut kernel)
        .revolve(curve, &options)
        .context("Revolve failed")?;

    let stats = analyze(kernel.solid(solid)?.mesh());
    if let Some(path) = output {
        write_buffers(&kernel, &[solid], path)?;
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{} {} {:.1}°", "✓".green(), "Revolved".bold(), angle);
        println!("  {}", stats.summary().bright_black());
    }
    Ok(())
}

fn subdivide_command(
    config: KernelConfig,
    input: &Path,
    levels: usize,
    creases: bool,
    quadify: bool,
    output: Option<&Path>,
    cli: &Cli,
) -> Result<()> {
    let mut kernel = load_scene(config, input)?;
    let options = SubdivisionOptions {
        levels,
        preserve_creases: creases,
        ..Default::default()
    };
    let solids = solid_ids(&kernel);
    if solids.is_empty() {
        bail!("No solids in {}", input.display());
    }

    let mut report = Vec::new();
    for &id in &solids {
        let solid = kernel.solid_mut(id)?;
        if quadify {
            QuadTools::retopologize_to_quads(solid, &QuadConversionOptions::default())
                .with_context(|| format!("Quad conversion failed for {id}"))?;
        }
        SubD::subdivide(solid, &options).with_context(|| format!("Subdivision failed for {id}"))?;
        let stats = analyze(solid.mesh());
        if cli.verbose && !cli.json {
            println!("{} {}", id.to_string().cyan(), stats.summary().bright_black());
        }
        report.push((id, stats));
    }

    if let Some(path) = output {
        write_buffers(&kernel, &solids, path)?;
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} Subdivided {} solid(s) x{} level(s)",
            "✓".green(),
            report.len().to_string().cyan(),
            levels
        );
    }
    Ok(())
}

fn info_command(config: KernelConfig, input: &Path, cli: &Cli) -> Result<()> {
    let kernel = load_scene(config, input)?;
    let report: Vec<_> = kernel
        .objects()
        .iter()
        .map(|object| (object.id(), object.object_type(), analyze(object.mesh())))
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "═".repeat(60).bright_black());
    println!("{} {}", "Scene".bold(), input.display().to_string().cyan());
    println!("{}", "═".repeat(60).bright_black());
    for (id, kind, stats) in &report {
        println!("  {} {:<6} {}", id.to_string().cyan(), kind.to_string(), stats.summary().bright_black());
    }
    println!("  {} {}", "Objects:".bright_black(), report.len());
    Ok(())
}

fn export_command(config: KernelConfig, input: &Path, output: &Path, cli: &Cli) -> Result<()> {
    let kernel = load_scene(config, input)?;
    let ids: Vec<ObjectId> = kernel.objects().iter().map(|o| o.id()).collect();
    write_buffers(&kernel, &ids, output)?;
    if !cli.json {
        println!(
            "{} Exported {} buffer(s) -> {}",
            "✓".green(),
            ids.len(),
            output.display().to_string().cyan()
        );
    }
    Ok(())
}

fn solid_ids(kernel: &GeometryKernel) -> Vec<ObjectId> {
    kernel
        .objects()
        .iter()
        .filter(|o| matches!(o.shape(), Shape::Solid(_)))
        .map(|o| o.id())
        .collect()
}

fn write_buffers(kernel: &GeometryKernel, ids: &[ObjectId], path: &Path) -> Result<()> {
    let buffers = ids
        .iter()
        .map(|&id| Ok((id, kernel.build_mesh_buffer(id)?)))
        .collect::<Result<Vec<(ObjectId, MeshBuffer)>>>()?;
    let json = serde_json::to_string_pretty(&buffers)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

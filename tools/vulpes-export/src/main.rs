//! vulpes-export - Vulpes Engine asset export tool
//!
//! Converts glTF/GLB and OBJ sources to flattened meshes (.vem) and baked
//! skeletal animation (.ves)

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use vulpes_common::Axis;
use vulpes_export::manifest::{self, MESH_EXT, SKELETON_EXT};
use vulpes_export::options::DEFAULT_FRAME_RATE;
use vulpes_export::{MeshExportOptions, ObjectKind, SkeletonExportOptions, import, inspect};

#[derive(Parser)]
#[command(name = "vulpes-export")]
#[command(about = "Vulpes Engine asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build assets from a manifest file
    Build {
        /// Path to vulpes.toml manifest
        #[arg(default_value = "vulpes.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest and run every export without writing
    Check {
        /// Path to vulpes.toml manifest
        #[arg(default_value = "vulpes.toml")]
        manifest: PathBuf,
    },

    /// Export a mesh object to .vem
    Mesh {
        /// Input file (glTF/GLB/OBJ)
        input: PathBuf,

        /// Output .vem file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Object to export (default: first mesh)
        #[arg(long)]
        object: Option<String>,

        #[command(flatten)]
        settings: MeshSettings,
    },

    /// Bake an armature and its actions to .ves
    Skeleton {
        /// Input file (glTF/GLB)
        input: PathBuf,

        /// Output .ves file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Armature to export (default: first armature)
        #[arg(long)]
        object: Option<String>,

        /// Frames per second used to sample animation
        #[arg(short, long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: f32,
    },

    /// Decode a .vem or .ves file and print a summary
    Inspect {
        /// File to inspect
        file: PathBuf,
    },

    /// List objects and actions in a source file
    List {
        /// Input file (glTF/GLB/OBJ)
        input: PathBuf,
    },
}

#[derive(Args)]
struct MeshSettings {
    /// Use the base mesh instead of the modifier-evaluated one
    #[arg(long)]
    no_modifiers: bool,

    /// Skip normals
    #[arg(long)]
    no_normals: bool,

    /// Skip UV coordinates
    #[arg(long)]
    no_uvs: bool,

    /// Skip tangents and bitangents
    #[arg(long)]
    no_tangents: bool,

    /// Export bone weights (requires a parent armature)
    #[arg(long)]
    weights: bool,

    /// Global scale (0.01 - 1000)
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Forward axis of the exported frame
    #[arg(long, default_value = "-Z", allow_hyphen_values = true)]
    forward: Axis,

    /// Up axis of the exported frame
    #[arg(long, default_value = "Y", allow_hyphen_values = true)]
    up: Axis,
}

impl From<MeshSettings> for MeshExportOptions {
    fn from(settings: MeshSettings) -> Self {
        Self {
            apply_modifiers: !settings.no_modifiers,
            export_normals: !settings.no_normals,
            export_uvs: !settings.no_uvs,
            export_tangents: !settings.no_tangents,
            export_armature_weights: settings.weights,
            scale: settings.scale,
            forward: settings.forward,
            up: settings.up,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building assets from {:?}", manifest);
            }
            let ctx = manifest::load_manifest(&manifest)?;
            let written = manifest::build_all(&ctx, output.as_deref())?;
            tracing::info!("Build complete! {} files written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let ctx = manifest::load_manifest(&manifest)?;
            manifest::check(&ctx)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Mesh {
            input,
            output,
            object,
            settings,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(MESH_EXT));
            tracing::info!("Exporting {:?} -> {:?}", input, output);

            let mut scene = import::load_scene(&input, DEFAULT_FRAME_RATE)?;
            scene.select_for_export(object.as_deref(), ObjectKind::Mesh);
            vulpes_export::export_vem(&scene, &output, &settings.into())
                .with_context(|| format!("Failed to export mesh from {:?}", input))?;
            tracing::info!("Done!");
        }

        Commands::Skeleton {
            input,
            output,
            object,
            frame_rate,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(SKELETON_EXT));
            tracing::info!("Exporting skeleton {:?} -> {:?}", input, output);

            let options = SkeletonExportOptions { frame_rate };
            let mut scene = import::load_scene(&input, frame_rate)?;
            scene.select_for_export(object.as_deref(), ObjectKind::Armature);
            vulpes_export::export_ves(&mut scene, &output, &options)
                .with_context(|| format!("Failed to export skeleton from {:?}", input))?;
            tracing::info!("Done!");
        }

        Commands::Inspect { file } => {
            let asset = inspect::read_asset(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            tracing::info!("{:?}:", file);
            for line in asset.summary() {
                tracing::info!("{}", line);
            }
        }

        Commands::List { input } => {
            let scene = import::load_scene(&input, DEFAULT_FRAME_RATE)?;
            tracing::info!("Objects in {:?}:", input);
            for line in inspect::list_objects(&scene) {
                tracing::info!("  {}", line);
            }
        }
    }

    Ok(())
}

//! vulpes.toml manifest parsing and batch builds
//!
//! ```toml
//! [output]
//! dir = "build"
//!
//! [[meshes]]
//! id = "hero"
//! path = "models/hero.glb"
//! object = "Body"
//! export_armature_weights = true
//!
//! [[skeletons]]
//! id = "hero_rig"
//! path = "models/hero.glb"
//! frame_rate = 30
//! ```
//!
//! Source paths are relative to the manifest's directory.

use anyhow::{Context, Result};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::import::load_scene;
use crate::mesh::{convert_mesh_to_memory, export_vem};
use crate::options::{DEFAULT_FRAME_RATE, MeshExportOptions, SkeletonExportOptions};
use crate::scene::{ObjectKind, Scene};
use crate::skeleton::{convert_skeleton_to_memory, export_ves};

/// Extension of exported meshes
pub const MESH_EXT: &str = "vem";
/// Extension of exported skeletons
pub const SKELETON_EXT: &str = "ves";

/// vulpes.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,
    #[serde(default)]
    pub skeletons: Vec<SkeletonEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

/// One `.vem` to build
#[derive(Debug, Deserialize)]
pub struct MeshEntry {
    pub id: String,
    pub path: PathBuf,
    /// Object to export (default: first mesh in the source)
    #[serde(default)]
    pub object: Option<String>,
    #[serde(flatten)]
    pub options: MeshExportOptions,
}

/// One `.ves` to build
#[derive(Debug, Deserialize)]
pub struct SkeletonEntry {
    pub id: String,
    pub path: PathBuf,
    /// Armature to export (default: first armature in the source)
    #[serde(default)]
    pub object: Option<String>,
    #[serde(flatten)]
    pub options: SkeletonExportOptions,
}

impl ExportManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse vulpes.toml")
    }

    /// Check ids and export options
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for entry in &self.meshes {
            if !ids.insert(entry.id.as_str()) {
                anyhow::bail!("Duplicate mesh id '{}' in vulpes.toml", entry.id);
            }
            entry
                .options
                .validate()
                .with_context(|| format!("Invalid options for mesh '{}'", entry.id))?;
        }

        let mut ids = HashSet::new();
        for entry in &self.skeletons {
            if !ids.insert(entry.id.as_str()) {
                anyhow::bail!("Duplicate skeleton id '{}' in vulpes.toml", entry.id);
            }
            entry
                .options
                .validate()
                .with_context(|| format!("Invalid options for skeleton '{}'", entry.id))?;
        }
        Ok(())
    }
}

/// A manifest together with the directory its paths are relative to
#[derive(Debug)]
pub struct ManifestContext {
    pub manifest: ExportManifest,
    pub project_dir: PathBuf,
}

impl ManifestContext {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.project_dir.join(path)
    }

    pub fn output_dir(&self, output_override: Option<&Path>) -> PathBuf {
        match output_override {
            Some(dir) => dir.to_path_buf(),
            None => self.resolve(&self.manifest.output.dir),
        }
    }
}

/// Load and validate a manifest
pub fn load_manifest(manifest_path: &Path) -> Result<ManifestContext> {
    let manifest = ExportManifest::load(manifest_path)?;
    manifest.validate()?;

    let project_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    Ok(ManifestContext {
        manifest,
        project_dir,
    })
}

fn load_selected(
    ctx: &ManifestContext,
    path: &Path,
    object: Option<&str>,
    kind: ObjectKind,
    frame_rate: f32,
) -> Result<Scene> {
    let source = ctx.resolve(path);
    let mut scene = load_scene(&source, frame_rate)?;
    if scene.select_for_export(object, kind).is_none() {
        match object {
            Some(name) => tracing::warn!("Object '{}' not found in {:?}", name, source),
            None => tracing::warn!("No {} object in {:?}", kind, source),
        }
    }
    Ok(scene)
}

/// Export every manifest entry; returns the written files
pub fn build_all(ctx: &ManifestContext, output_override: Option<&Path>) -> Result<Vec<PathBuf>> {
    let output_dir = ctx.output_dir(output_override);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut written = Vec::new();

    for entry in &ctx.manifest.meshes {
        let output = output_dir.join(format!("{}.{}", entry.id, MESH_EXT));
        tracing::info!("Exporting mesh: {} -> {:?}", entry.id, output);

        let scene = load_selected(
            ctx,
            &entry.path,
            entry.object.as_deref(),
            ObjectKind::Mesh,
            DEFAULT_FRAME_RATE,
        )
        .with_context(|| format!("Failed to load mesh '{}'", entry.id))?;
        export_vem(&scene, &output, &entry.options)
            .with_context(|| format!("Failed to export mesh '{}'", entry.id))?;
        written.push(output);
    }

    for entry in &ctx.manifest.skeletons {
        let output = output_dir.join(format!("{}.{}", entry.id, SKELETON_EXT));
        tracing::info!("Exporting skeleton: {} -> {:?}", entry.id, output);

        let mut scene = load_selected(
            ctx,
            &entry.path,
            entry.object.as_deref(),
            ObjectKind::Armature,
            entry.options.frame_rate,
        )
        .with_context(|| format!("Failed to load skeleton '{}'", entry.id))?;
        export_ves(&mut scene, &output, &entry.options)
            .with_context(|| format!("Failed to export skeleton '{}'", entry.id))?;
        written.push(output);
    }

    Ok(written)
}

/// Run every export in memory without writing anything
pub fn check(ctx: &ManifestContext) -> Result<()> {
    for entry in &ctx.manifest.meshes {
        let scene = load_selected(
            ctx,
            &entry.path,
            entry.object.as_deref(),
            ObjectKind::Mesh,
            DEFAULT_FRAME_RATE,
        )
        .with_context(|| format!("Failed to load mesh '{}'", entry.id))?;
        let mesh = convert_mesh_to_memory(&scene, &entry.options)
            .with_context(|| format!("Mesh '{}' would fail to export", entry.id))?;
        tracing::info!("  mesh '{}': {} vertices", entry.id, mesh.vertex_count());
    }

    for entry in &ctx.manifest.skeletons {
        let mut scene = load_selected(
            ctx,
            &entry.path,
            entry.object.as_deref(),
            ObjectKind::Armature,
            entry.options.frame_rate,
        )
        .with_context(|| format!("Failed to load skeleton '{}'", entry.id))?;
        let skeleton = convert_skeleton_to_memory(&mut scene, &entry.options)
            .with_context(|| format!("Skeleton '{}' would fail to export", entry.id))?;
        tracing::info!(
            "  skeleton '{}': {} bones, {} actions",
            entry.id,
            skeleton.bones.len(),
            skeleton.actions.len()
        );
    }

    Ok(())
}

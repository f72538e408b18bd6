//! Command-line interface for preparing libraries and building mosaics

use crate::algorithm::collage::CollageConfig;
use crate::algorithm::cube::CubeConfig;
use crate::algorithm::executor::{MosaicConfig, MosaicExecutor, SearchMethod};
use crate::analysis::candidate::{Orientation, Pool};
use crate::analysis::features::FeatureExtractor;
use crate::analysis::matcher::ChannelWeights;
use crate::io::configuration::{
    DEFAULT_COLLAGE_MAX_SIZE, DEFAULT_COLLAGE_MIN_SIZE, DEFAULT_CUBE_LEAF_THRESHOLD,
    DEFAULT_CUBE_MAX_DEPTH, DEFAULT_MIN_DISTANCE, DEFAULT_SEED, DEFAULT_TILE_SIZE,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{FilterScaler, ImageRows, load_rgb, save_rgb};
use crate::io::library::{load_pool, prepare_library};
use crate::io::progress::ProgressReporter;
use crate::io::protocol::Protocol;
use crate::io::render::{RenderOptions, render};
use crate::math::color::ColorSpace;
use crate::spatial::placement::MosaicLayout;
use crate::spatial::tiling::Tiling;
use clap::{Args, Parser, Subcommand};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "photomosaic")]
#[command(
    author,
    version,
    about = "Build photomosaics and collages from libraries of tile images"
)]
/// Command-line arguments for the mosaic tool
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Operations of the mosaic tool
#[derive(Subcommand)]
pub enum Command {
    /// Scan directories of tile images and append them to their tables
    Prepare {
        /// Library directories to prepare
        #[arg(value_name = "LIBRARY", required = true)]
        libraries: Vec<PathBuf>,
    },
    /// Build a grid mosaic of a target image
    Mosaic(MosaicArgs),
    /// Build a free-form collage of a target image
    Collage(CollageArgs),
    /// Re-render a mosaic from a protocol without searching
    Replay(ReplayArgs),
}

/// Where candidates come from and how they are compared
#[derive(Args, Clone, Debug)]
pub struct PoolArgs {
    /// Prepared library directory (repeatable)
    #[arg(short, long = "library", value_name = "DIR")]
    pub libraries: Vec<PathBuf>,

    /// Image whose tiles also serve as candidates
    #[arg(long, value_name = "IMAGE")]
    pub anti: Option<PathBuf>,

    /// Color space of the feature vectors
    #[arg(long, value_enum, default_value_t = ColorSpace::Rgb)]
    pub color_space: ColorSpace,

    /// Per-channel score weights
    #[arg(
        long,
        num_args = 3,
        value_names = ["W0", "W1", "W2"],
        default_values_t = [1.0, 1.0, 1.0]
    )]
    pub weights: Vec<f32>,
}

/// Grid geometry of a mosaic
#[derive(Args, Clone, Copy, Debug)]
pub struct GridArgs {
    /// Tile width in target pixels
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_width: u32,

    /// Tile height in target pixels
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_height: u32,

    /// Exact number of tile columns, overriding the tile width
    #[arg(long)]
    pub columns: Option<u32>,

    /// Exact number of tile rows, overriding the tile height
    #[arg(long)]
    pub rows: Option<u32>,
}

impl GridArgs {
    /// Tiling of an image of the given size
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting tile counts are invalid
    pub fn tiling(&self, width: u32, height: u32) -> Result<Tiling> {
        let by_size = Tiling::with_tile_size(width, height, self.tile_width, self.tile_height)?;
        Tiling::new(
            width,
            height,
            self.columns.unwrap_or_else(|| by_size.metawidth()),
            self.rows.unwrap_or_else(|| by_size.metaheight()),
        )
    }
}

/// Output controls shared by every rendering command
#[derive(Args, Clone, Copy, Debug)]
pub struct OutputArgs {
    /// Output size relative to the target
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Weight of the target blended over the tiles
    #[arg(long, default_value_t = 0.0)]
    pub blend: f32,
}

impl OutputArgs {
    const fn options(self) -> RenderOptions {
        RenderOptions {
            scale: self.scale,
            blend: self.blend,
        }
    }
}

/// Arguments of the `mosaic` command
#[derive(Args, Clone, Debug)]
// Independent on/off switches for each flip axis
#[allow(clippy::struct_excessive_bools)]
pub struct MosaicArgs {
    /// Image to approximate
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Output image path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub pool: PoolArgs,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub grid: GridArgs,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub output_options: OutputArgs,

    /// Assignment strategy
    #[arg(short, long, value_enum, default_value_t = SearchMethod::Local)]
    pub method: SearchMethod,

    /// Radius in tiles within which local search forbids reuse
    #[arg(short = 'd', long, default_value_t = DEFAULT_MIN_DISTANCE)]
    pub min_distance: u32,

    /// Radius in tiles around an anti tile's origin it may not fill first
    #[arg(long, default_value_t = 0)]
    pub anti_radius: u32,

    /// Number of tiles to fill in subset mode
    #[arg(long)]
    pub subset_count: Option<usize>,

    /// Forbid horizontal flips
    #[arg(long)]
    pub no_flip_horizontal: bool,

    /// Forbid vertical flips
    #[arg(long)]
    pub no_flip_vertical: bool,

    /// Deepest split of the color cube in cube mode
    #[arg(long, default_value_t = DEFAULT_CUBE_MAX_DEPTH)]
    pub cube_depth: u32,

    /// Candidate count below which a cube cell is assigned directly
    #[arg(long, default_value_t = DEFAULT_CUBE_LEAF_THRESHOLD)]
    pub cube_threshold: usize,

    /// Write the mosaic protocol to this file
    #[arg(long, value_name = "FILE")]
    pub protocol: Option<PathBuf>,
}

/// Arguments of the `collage` command
#[derive(Args, Clone, Debug)]
pub struct CollageArgs {
    /// Image to approximate
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Output image path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub pool: PoolArgs,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub output_options: OutputArgs,

    /// Tile width for cutting an anti image into candidates
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub anti_tile_size: u32,

    /// Smallest square edge in target pixels
    #[arg(long, default_value_t = DEFAULT_COLLAGE_MIN_SIZE)]
    pub min_size: u32,

    /// Largest square edge in target pixels
    #[arg(long, default_value_t = DEFAULT_COLLAGE_MAX_SIZE)]
    pub max_size: u32,

    /// Minimum Manhattan distance between two uses of one candidate
    #[arg(short = 'd', long, default_value_t = 0)]
    pub min_distance: u32,

    /// Random seed for reproducible placement
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Write the collage protocol to this file
    #[arg(long, value_name = "FILE")]
    pub protocol: Option<PathBuf>,
}

/// Arguments of the `replay` command
#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Protocol written by an earlier run
    #[arg(value_name = "PROTOCOL")]
    pub protocol: PathBuf,

    /// Output image path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub pool: PoolArgs,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub grid: GridArgs,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub output_options: OutputArgs,

    /// Target image, needed only for blending
    #[arg(long, value_name = "IMAGE")]
    pub target: Option<PathBuf>,

    /// Tile size the anti image was cut with by `collage`
    ///
    /// Anti tiles are named by their grid coordinate, so the anti image must
    /// be cut exactly as in the recorded run. Without this flag it is cut
    /// with the grid options, as `mosaic` does.
    #[arg(long, value_name = "PIXELS")]
    pub anti_tile_size: Option<u32>,
}

impl ReplayArgs {
    /// Grid the anti image is cut with
    pub fn anti_grid(&self) -> GridArgs {
        self.anti_tile_size.map_or(self.grid, square_grid)
    }
}

/// Grid of square tiles of one edge size
const fn square_grid(size: u32) -> GridArgs {
    GridArgs {
        tile_width: size,
        tile_height: size,
        columns: None,
        rows: None,
    }
}

impl PoolArgs {
    fn weights(&self) -> Result<ChannelWeights> {
        match self.weights.as_slice() {
            &[a, b, c] => ChannelWeights::new([a, b, c]),
            other => Err(invalid_parameter(
                "weights",
                &format!("{other:?}"),
                &"exactly three weights are required",
            )),
        }
    }

    /// Load libraries and cut the anti image, if any
    fn load(
        &self,
        extractor: &FeatureExtractor<FilterScaler>,
        anti_grid: GridArgs,
    ) -> Result<Pool> {
        let mut pool = load_pool(&self.libraries, self.color_space)?;
        if let Some(path) = &self.anti {
            let image = load_rgb(path)?;
            let tiling = anti_grid.tiling(image.width(), image.height())?;
            pool.add_anti_image(path, image, tiling, extractor)?;
        }
        info!(candidates = pool.len(), "pool ready");
        Ok(pool)
    }
}

/// Runs the parsed command
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns the first error raised by loading, searching or writing
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Prepare { libraries } => self.prepare(libraries),
            Command::Mosaic(args) => self.mosaic(args),
            Command::Collage(args) => self.collage(args),
            Command::Replay(args) => self.replay(args),
        }
    }

    fn progress(&self) -> ProgressReporter {
        if self.cli.quiet {
            ProgressReporter::hidden()
        } else {
            ProgressReporter::new("starting", 0)
        }
    }

    fn prepare(&self, libraries: &[PathBuf]) -> Result<()> {
        let extractor = FeatureExtractor::new(FilterScaler::default(), ColorSpace::Rgb);
        let progress = self.progress();
        for library in libraries {
            prepare_library(library, &extractor, &progress)?;
        }
        Ok(())
    }

    fn mosaic(&self, args: &MosaicArgs) -> Result<()> {
        let extractor = FeatureExtractor::new(FilterScaler::default(), args.pool.color_space);
        let pool = args.pool.load(&extractor, args.grid)?;
        let target = load_rgb(&args.target)?;
        let tiling = args.grid.tiling(target.width(), target.height())?;

        let config = MosaicConfig {
            method: args.method,
            min_distance: args.min_distance,
            anti_radius: args.anti_radius,
            subset_count: args.subset_count,
            orientations: Orientation::new(!args.no_flip_horizontal, !args.no_flip_vertical),
            weights: args.pool.weights()?,
            cube: CubeConfig {
                max_depth: args.cube_depth,
                leaf_threshold: args.cube_threshold,
                weights: args.pool.weights()?,
            },
        };

        let progress = self.progress();
        let executor = MosaicExecutor::new(&pool, extractor, config);
        let mut rows = ImageRows::new(target.clone());
        let layout = executor.generate(&mut rows, &tiling, &progress)?.layout();

        write_outputs(
            &layout,
            &pool,
            &target,
            args.output_options,
            &args.output,
            args.protocol.as_deref(),
            &progress,
        )
    }

    fn collage(&self, args: &CollageArgs) -> Result<()> {
        let extractor = FeatureExtractor::new(FilterScaler::default(), args.pool.color_space);
        let pool = args
            .pool
            .load(&extractor, square_grid(args.anti_tile_size))?;
        let target = load_rgb(&args.target)?;

        let config = CollageConfig {
            min_size: args.min_size,
            max_size: args.max_size,
            min_distance: args.min_distance,
            seed: args.seed,
        };
        let matcher_config = MosaicConfig {
            weights: args.pool.weights()?,
            ..MosaicConfig::default()
        };

        let progress = self.progress();
        let executor = MosaicExecutor::new(&pool, extractor, matcher_config);
        let layout = executor.collage(&target, config, &progress)?;

        write_outputs(
            &layout,
            &pool,
            &target,
            args.output_options,
            &args.output,
            args.protocol.as_deref(),
            &progress,
        )
    }

    fn replay(&self, args: &ReplayArgs) -> Result<()> {
        let extractor = FeatureExtractor::new(FilterScaler::default(), args.pool.color_space);
        let pool = args.pool.load(&extractor, args.anti_grid())?;
        let protocol = Protocol::read(&args.protocol)?;
        let layout = protocol.resolve(&pool)?;
        let target = args.target.as_deref().map(load_rgb).transpose()?;

        let progress = self.progress();
        let image = render(
            &layout,
            &pool,
            extractor.scaler(),
            args.output_options.options(),
            target.as_ref(),
            &progress,
        )?;
        save_rgb(&image, &args.output)?;
        info!(
            output = %args.output.display(),
            placements = layout.placements.len(),
            "replayed"
        );
        Ok(())
    }
}

/// Write the protocol if requested, then render and save
fn write_outputs(
    layout: &MosaicLayout,
    pool: &Pool,
    target: &RgbImage,
    output: OutputArgs,
    path: &Path,
    protocol: Option<&Path>,
    progress: &ProgressReporter,
) -> Result<()> {
    if let Some(protocol_path) = protocol {
        Protocol::from_layout(layout, pool)?.write(protocol_path)?;
        info!(protocol = %protocol_path.display(), "protocol written");
    }

    let image = render(
        layout,
        pool,
        &FilterScaler::default(),
        output.options(),
        Some(target),
        progress,
    )?;
    save_rgb(&image, path)?;
    info!(output = %path.display(), placements = layout.placements.len(), "saved");
    Ok(())
}

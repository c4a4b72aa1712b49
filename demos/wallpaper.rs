#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{
    error::Error,
    io::Cursor,
    path::{Path, PathBuf},
};

use calframe::{
    collaborators::{
        CommandSetter, DayCode, DirectorySource, ImageSource, InvalidDayCode, LogNotifier,
        Notifier, WallpaperSetter,
    },
    EmptyClusterPolicy, FrameOptions, KmeansOptions, OversizePolicy, PaletteExtractor,
    WallpaperPipeline,
};
use clap::{Parser, Subcommand, ValueEnum};
use image::{ImageFormat, RgbImage};

#[derive(Copy, Clone, ValueEnum)]
enum CliEmptyCluster {
    Retain,
    Reseed,
    Fail,
}

impl From<CliEmptyCluster> for EmptyClusterPolicy {
    fn from(value: CliEmptyCluster) -> Self {
        match value {
            CliEmptyCluster::Retain => EmptyClusterPolicy::RetainPrevious,
            CliEmptyCluster::Reseed => EmptyClusterPolicy::ReseedFarthest,
            CliEmptyCluster::Fail => EmptyClusterPolicy::Fail,
        }
    }
}

#[derive(Subcommand)]
enum Source {
    /// Read the illustration from an image file
    File { path: PathBuf },
    /// Use the first cached illustration of a day
    Day {
        /// yymmdd (e.g. 180626), today or random
        #[arg(value_parser = parse_day)]
        day: DayCode,

        #[arg(long, default_value = "data")]
        cache: PathBuf,
    },
}

#[derive(Parser)]
struct Options {
    #[arg(long, default_value_t = 2560)]
    width: u32,

    #[arg(long, default_value_t = 1440)]
    height: u32,

    #[arg(short, long, default_value_t = 10)]
    frame_width: u32,

    #[arg(short, long, default_value_t = 0)]
    crop: u32,

    #[arg(long)]
    invert: bool,

    /// Clip oversized images instead of failing
    #[arg(long)]
    clip: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = CliEmptyCluster::Retain)]
    empty_cluster: CliEmptyCluster,

    #[arg(long)]
    single_threaded: bool,

    /// Defaults to compiled_<name>.png
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Set the result as the desktop background
    #[arg(long)]
    apply: bool,

    /// Log the palette and the result through the notifier
    #[arg(long)]
    notify: bool,

    #[command(subcommand)]
    source: Source,
}

fn parse_day(s: &str) -> Result<DayCode, InvalidDayCode> {
    match s {
        "today" => Ok(DayCode::today()),
        "random" => Ok(DayCode::random(&mut rand::thread_rng())),
        _ => s.parse(),
    }
}

/// Sets `path` as the background of the detected desktop.
fn apply(path: &Path) -> Result<(), calframe::Error> {
    CommandSetter::detect()?.apply(path)?;
    Ok(())
}

fn load(source: &Source) -> Result<(RgbImage, String), Box<dyn Error>> {
    match source {
        Source::File { path } => {
            let name = path
                .file_stem()
                .map_or_else(|| "image".to_owned(), |s| s.to_string_lossy().into_owned());
            Ok((image::open(path)?.into_rgb8(), name))
        }
        Source::Day { day, cache } => {
            let images = DirectorySource::new(cache).fetch(*day)?;
            let bytes = images
                .first()
                .ok_or_else(|| format!("no images for {day} in {}", cache.display()))?;
            Ok((image::load_from_memory(bytes)?.into_rgb8(), day.to_string()))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let options = Options::parse();
    let (image, name) = load(&options.source)?;

    let mut kmeans = KmeansOptions::new().empty_cluster_policy(options.empty_cluster.into());
    if let Some(seed) = options.seed {
        kmeans = kmeans.seed(seed);
    }

    let frame = FrameOptions::new()
        .resolution(options.width, options.height)
        .frame_width(options.frame_width)
        .crop(options.crop)
        .invert(options.invert)
        .oversize(if options.clip { OversizePolicy::Clip } else { OversizePolicy::Reject });

    let pipeline = WallpaperPipeline::new()
        .extractor(PaletteExtractor::new().kmeans(kmeans))
        .frame(frame);

    let (palette, wallpaper) = if options.single_threaded {
        pipeline.render(&image)?
    } else {
        pipeline.render_par(&image)?
    };

    let output = options
        .output
        .unwrap_or_else(|| PathBuf::from(format!("compiled_{name}.png")));
    wallpaper.save(&output)?;
    println!("{} {}", palette.to_hex().join(" "), output.display());

    if options.notify {
        let notifier = LogNotifier;
        let mut png = Cursor::new(Vec::new());
        wallpaper.write_to(&mut png, ImageFormat::Png)?;
        notifier.send_text(&palette.to_hex().join(" "))?;
        notifier.send_image(png.get_ref(), &name)?;
    }

    if options.apply {
        apply(&output)?;
    }

    Ok(())
}

use anyhow::{Context, Result};
use asset_gen::{
    config::{AssetConfig, IconJob},
    variants::{self, BlueIconMethod},
};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::{path::PathBuf, process::ExitCode};

#[derive(Debug, Parser)]
#[clap(
    name = "asset-gen",
    about = "Generate blue app icon variants and the store feature graphic"
)]
struct Args {
    /// JSON file overriding the default asset paths.
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that relative paths in the config are resolved against.
    #[clap(long, value_name = "DIR", default_value = ".")]
    base_dir: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the blue-tinted icon variant
    BlueIcon {
        #[clap(flatten)]
        paths: IconArgs,

        /// Colour adjustment method
        #[clap(long, value_enum, default_value_t = BlueIconMethod::Tint)]
        method: BlueIconMethod,
    },

    /// Create the professional blue icon variant
    ProIcon {
        #[clap(flatten)]
        paths: IconArgs,
    },

    /// Create the 1024x500 Play Store feature graphic
    FeatureGraphic {
        /// Output PNG path
        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// TrueType font to render text with
        #[clap(long, value_name = "FILE")]
        font: Option<PathBuf>,
    },

    /// Create every asset
    All,
}

#[derive(Debug, clap::Args)]
struct IconArgs {
    /// Source icon (any format the image decoder supports)
    #[clap(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PNG path
    #[clap(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Secondary copy for the Cast receiver
    #[clap(long, value_name = "FILE", conflicts_with = "no_cast")]
    cast: Option<PathBuf>,

    /// Skip the Cast receiver copy
    #[clap(long)]
    no_cast: bool,

    /// Tint colour (CSS colour format)
    #[clap(long, value_name = "COLOR")]
    tint: Option<String>,
}

impl IconArgs {
    fn apply(self, job: &mut IconJob) {
        if let Some(input) = self.input {
            job.source_path = input;
        }
        if let Some(output) = self.output {
            job.output_path = output;
        }
        if self.no_cast {
            job.cast_output_path = None;
        } else if let Some(cast) = self.cast {
            job.cast_output_path = Some(cast);
        }
        if let Some(tint) = self.tint {
            job.tint_color = tint;
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AssetConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AssetConfig::default(),
    };
    let mut config = config.rebase(&args.base_dir);

    match args.command {
        Command::BlueIcon { paths, method } => {
            paths.apply(&mut config.blue_icon);
            variants::create_blue_icon(&config.blue_icon, method)
                .context("Failed to create blue icon variant")?;
            info!("🎉 Blue icon variant creation completed!");
        }
        Command::ProIcon { paths } => {
            paths.apply(&mut config.pro_icon);
            variants::create_pro_icon(&config.pro_icon)
                .context("Professional blue icon creation failed")?;
            info!("🎉 Professional blue icon creation completed!");
        }
        Command::FeatureGraphic { output, font } => {
            let job = &mut config.feature_graphic;
            if let Some(output) = output {
                job.output_path = output;
            }
            if let Some(font) = font {
                job.font_path = Some(font);
            }
            variants::create_feature_graphic(job)
                .context("Failed to create feature graphic")?;
        }
        Command::All => {
            variants::check_source(&config.blue_icon)?;
            variants::check_source(&config.pro_icon)?;

            let mut written =
                variants::create_blue_icon(&config.blue_icon, BlueIconMethod::Tint)
                    .context("Failed to create blue icon variant")?;
            written.extend(
                variants::create_pro_icon(&config.pro_icon)
                    .context("Professional blue icon creation failed")?,
            );
            written.extend(
                variants::create_feature_graphic(&config.feature_graphic)
                    .context("Failed to create feature graphic")?,
            );

            info!("🎉 Generated {} files", written.len());
        }
    }

    Ok(())
}

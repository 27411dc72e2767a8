//! png2ico - converts a PNG image into a multi-resolution ICO file.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use pngico::fsio::default_output_path;
use pngico::{Converter, IconDir, PayloadFormat, ResolutionPlan};

//===========================================================================//

/// Converts a PNG image into an ICO file holding 256, 128, 64, 48, 32 and
/// 16 pixel versions of it.
#[derive(Parser, Debug)]
#[command(name = "png2ico")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    png2ico logo.png                      Writes logo.ico next to the input
    png2ico logo.png app.ico --format bmp Uses uncompressed BMP payloads
    png2ico logo.png --sizes 48,32,16     Only the small sizes
    png2ico --list app.ico                Shows the images in an ICO file")]
struct Args {
    /// Input PNG file (or ICO file with --list)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output ICO file [default: INPUT with an .ico extension]
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// How each image is stored inside the icon
    #[arg(short, long, value_enum, default_value = "png")]
    format: FormatArg,

    /// Comma-separated sizes, largest first (each 1-256)
    #[arg(short, long, value_delimiter = ',', value_name = "SIZES")]
    sizes: Option<Vec<u32>>,

    /// Render one size at a time instead of in parallel
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// List the images in an existing ICO file instead of converting
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Log progress to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    /// Compressed PNG images
    Png,
    /// Uncompressed 32-bpp BMP images
    Bmp,
    /// PNG above 64x64 pixels, BMP below
    Auto,
}

impl From<FormatArg> for PayloadFormat {
    fn from(arg: FormatArg) -> PayloadFormat {
        match arg {
            FormatArg::Png => PayloadFormat::Png,
            FormatArg::Bmp => PayloadFormat::Bmp,
            FormatArg::Auto => PayloadFormat::Auto,
        }
    }
}

//===========================================================================//

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    if args.list {
        return list(&args);
    }

    let plan = match args.sizes.clone() {
        Some(sizes) => match ResolutionPlan::new(sizes) {
            Ok(plan) => plan,
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::from(2);
            }
        },
        None => ResolutionPlan::standard(),
    };
    let output =
        args.output.clone().unwrap_or_else(|| default_output_path(&args.input));
    let converter = Converter::new(plan)
        .payload_format(args.format.into())
        .parallel(!args.sequential);

    if !args.json {
        println!(
            "Converting: {} -> {}",
            args.input.display(),
            output.display()
        );
    }
    let outcome = converter.convert_file(&args.input, &output);

    if args.json {
        let json = match serde_json::to_string_pretty(&outcome) {
            Ok(json) => json,
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::FAILURE;
            }
        };
        if outcome.success {
            println!("{json}");
        } else {
            eprintln!("{json}");
        }
    } else if outcome.success {
        println!("{}", outcome.message);
        println!("File: {}", output.display());
        println!("Resolutions: {}", outcome.resolutions.join(", "));
        println!("Size: {}", outcome.file_size);
    } else if let Some(error) = &outcome.error {
        eprintln!("Error: {error}");
    }

    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn list(args: &Args) -> ExitCode {
    let icondir = match File::open(&args.input).and_then(IconDir::read) {
        Ok(icondir) => icondir,
        Err(error) => {
            eprintln!("Error: cannot read {}: {error}", args.input.display());
            return ExitCode::FAILURE;
        }
    };
    for (index, entry) in icondir.entries().iter().enumerate() {
        let kind = if entry.is_png() { "PNG" } else { "BMP" };
        println!(
            "{:5}: {}x{} {}, {} bpp, {} bytes",
            index,
            entry.width(),
            entry.height(),
            kind,
            entry.bits_per_pixel(),
            entry.data().len()
        );
    }
    ExitCode::SUCCESS
}

/// Sends log output to stderr so stdout only carries results.  `RUST_LOG`
/// takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "pngico=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//===========================================================================//

use clap::{Args, Parser, Subcommand, ValueHint};
use feedr_io::ConvertOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "feedr", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (defaults to the config file, then "info")
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (defaults to <config dir>/feedr/feedr.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a Windmil table pair into a feeder model
    Convert {
        #[command(flatten)]
        tables: TableArgs,
        /// Write the model here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// Fail when the conversion reports errors
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        canvas: CanvasArgs,
    },
    /// Summarize what a conversion would produce
    Inspect {
        #[command(flatten)]
        tables: TableArgs,
        #[command(flatten)]
        canvas: CanvasArgs,
    },
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Primary equipment table (.std)
    #[arg(value_hint = ValueHint::FilePath)]
    pub primary: PathBuf,
    /// Secondary equipment table (.seq)
    #[arg(value_hint = ValueHint::FilePath)]
    pub secondary: PathBuf,
}

#[derive(Args, Debug, Default)]
pub struct CanvasArgs {
    /// Keep raw coordinates instead of fitting them to the canvas
    #[arg(long)]
    pub no_rescale: bool,
    #[arg(long)]
    pub canvas_width: Option<f64>,
    #[arg(long)]
    pub canvas_height: Option<f64>,
}

impl CanvasArgs {
    /// Apply command-line overrides on top of configured options.
    pub fn apply(&self, mut options: ConvertOptions) -> ConvertOptions {
        if self.no_rescale {
            options.rescale = false;
        }
        if let Some(width) = self.canvas_width {
            options.canvas_width = width;
        }
        if let Some(height) = self.canvas_height {
            options.canvas_height = height;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_configured_canvas() {
        let cli = Cli::parse_from([
            "feedr",
            "convert",
            "a.std",
            "a.seq",
            "--no-rescale",
            "--canvas-width",
            "640",
        ]);
        let Commands::Convert { canvas, strict, .. } = cli.command else {
            panic!("expected convert");
        };
        assert!(!strict);
        let options = canvas.apply(ConvertOptions::default());
        assert!(!options.rescale);
        assert_eq!(options.canvas_width, 640.0);
        assert_eq!(options.canvas_height, 1000.0);
    }
}

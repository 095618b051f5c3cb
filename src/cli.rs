use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use image_resizer::ResizerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "image-resizer",
    version,
    about = "Resize an image into ~/imageresizer and open the folder",
    long_about = "
Image Resizer

Resizes a gif, jpeg or png to exact pixel dimensions. The result keeps the
source file name and format and is written to ~/imageresizer (created on first
use, existing files are overwritten). The folder is opened afterwards.

Example Usage:
  # Resize to 400x300
  image-resizer resize -i ~/Pictures/photo.png -W 400 -H 300

  # Only change the width; height keeps the source value
  image-resizer resize -i ~/Pictures/photo.png -W 1024

  # Run the privileged side as a JSON-lines service on stdin/stdout
  image-resizer serve --no-reveal"
)]
pub struct Args {
    /// JSON config file (keys: destinationDir, jobTimeoutSecs, revealOutput)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Give up on a resize after this many seconds (0 = never)
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Do not open the output folder after a successful resize
    #[arg(long = "no-reveal", global = true)]
    pub no_reveal: bool,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resize a single image
    Resize {
        /// Image to resize (gif, jpeg or png)
        #[arg(short = 'i', long = "input", value_name = "FILE")]
        input: PathBuf,

        /// Target width in pixels (defaults to the source width)
        #[arg(short = 'W', long = "width", value_name = "PIXELS")]
        width: Option<String>,

        /// Target height in pixels (defaults to the source height)
        #[arg(short = 'H', long = "height", value_name = "PIXELS")]
        height: Option<String>,
    },

    /// Accept `image:resize` messages on stdin, answer with `image:done` on stdout
    Serve,
}

impl Args {
    /// Config file values, with command-line flags taking precedence.
    pub fn resizer_config(&self) -> Result<ResizerConfig> {
        let mut config = ResizerConfig::load(self.config_file.as_deref())?;
        if let Some(secs) = self.timeout_secs {
            config.set_timeout_secs(secs);
        }
        if self.no_reveal {
            config.reveal_output = false;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_resize() {
        let args = Args::try_parse_from([
            "image-resizer", "resize", "-i", "/tmp/a.png", "-W", "400", "-H", "300",
        ])
        .unwrap();
        match args.command {
            Command::Resize { input, width, height } => {
                assert_eq!(input, PathBuf::from("/tmp/a.png"));
                assert_eq!(width.as_deref(), Some("400"));
                assert_eq!(height.as_deref(), Some("300"));
            }
            Command::Serve => panic!("expected resize"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from(["image-resizer", "serve", "--timeout", "0", "--no-reveal"]).unwrap();
        if dirs::home_dir().is_some() {
            let config = args.resizer_config().unwrap();
            assert_eq!(config.job_timeout, None);
            assert!(!config.reveal_output);
        }

        let args = Args::try_parse_from(["image-resizer", "--timeout", "7", "serve"]).unwrap();
        if dirs::home_dir().is_some() {
            assert_eq!(
                args.resizer_config().unwrap().job_timeout,
                Some(Duration::from_secs(7))
            );
        }
    }
}

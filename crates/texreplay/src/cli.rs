use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "texreplay",
    author,
    version,
    about = "Drive the texture cache with a seeded synthetic workload"
)]
pub struct Cli {
    /// Cache configuration TOML file; built-in defaults are used when omitted.
    #[arg(long, value_name = "FILE", env = "TEXREPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of display lists to replay.
    #[arg(long, value_name = "N", default_value_t = 300)]
    pub frames: u32,

    /// Number of distinct textures in the workload.
    #[arg(long, value_name = "N", default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..=4096))]
    pub textures: u32,

    /// Seed for the workload generator.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub seed: u64,

    /// Run a purge pass every N frames (0 disables purging).
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub purge_every: u32,

    /// Print the final statistics as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["texreplay"]).expect("parse defaults");
        assert_eq!(cli.frames, 300);
        assert_eq!(cli.textures, 32);
        assert_eq!(cli.seed, 1);
        assert_eq!(cli.purge_every, 30);
        assert!(!cli.json);
    }

    #[test]
    fn rejects_zero_textures() {
        assert!(Cli::try_parse_from(["texreplay", "--textures", "0"]).is_err());
    }
}

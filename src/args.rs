use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Clone)]
#[command(
    display_name = "True Rating Processor",
    long_about = "Generates True Ratings and True Future Ratings from season stats and scouting reports"
)]
pub struct Args {
    /// Root URL of the stats feed. Seasons are read from `{root}/{year}/{kind}.csv`,
    /// rosters from `{root}/players.csv` and `{root}/teams.csv`.
    #[arg(short, long, env = "FEED_ROOT", help = "Stats feed root URL")]
    pub feed_root: String,

    /// Season to rate. Defaults to the current calendar year.
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Only rate these organizations (comma separated team ids)
    #[arg(short, long, value_delimiter = ',')]
    pub teams: Vec<i32>,

    /// JSON engine configuration; the built-in defaults are used when omitted
    #[arg(long, env = "ENGINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted cache document
    #[arg(long, env = "CACHE_DIR", default_value = ".cache")]
    pub cache_dir: PathBuf,

    /// Scouting source whose latest upload is used
    #[arg(long, env = "SCOUTING_SOURCE", default_value = "default")]
    pub scouting_source: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String
}

#[cfg(test)]
mod tests {
    use crate::args::Args;
    use clap::Parser;

    #[test]
    fn test_parse_team_list() {
        let args = Args::parse_from([
            "true-rating-processor",
            "--feed-root",
            "https://stats.example.org",
            "--year",
            "2021",
            "--teams",
            "3,7"
        ]);

        assert_eq!(args.year, Some(2021));
        assert_eq!(args.teams, vec![3, 7]);
        assert_eq!(args.scouting_source, "default");
        assert!(args.config.is_none());
    }
}

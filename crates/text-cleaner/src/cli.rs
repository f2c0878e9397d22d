use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "text-cleaner",
    version,
    about = "Strip markup, links, contact details and noisy punctuation from text"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "text-cleaner.yaml")]
    pub config: PathBuf,

    /// File to clean; reads stdin when absent or `-`
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// File to write the cleaned text to; writes stdout when absent or `-`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Re-clean the input file whenever it changes (live preview)
    #[arg(short, long, requires = "input")]
    pub watch: bool,

    /// Print a JSON report of what each rule removed to stderr
    #[arg(long)]
    pub report: bool,

    /// Log level or filter directive (overrides config file setting)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Journal file; enables the journal (overrides config file setting)
    #[arg(long)]
    pub journal: Option<PathBuf>,
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
    fn defaults_to_stdin_and_stdout() {
        let cli = Cli::try_parse_from(["text-cleaner"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("text-cleaner.yaml"));
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.watch);
    }

    #[test]
    fn watch_requires_an_input_file() {
        assert!(Cli::try_parse_from(["text-cleaner", "--watch"]).is_err());
        let cli =
            Cli::try_parse_from(["text-cleaner", "-w", "-i", "notes.html", "-o", "notes.txt"])
                .unwrap();
        assert!(cli.watch);
        assert_eq!(cli.input, Some(PathBuf::from("notes.html")));
    }
}

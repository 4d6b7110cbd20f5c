//! Command-line and environment configuration.

use crate::date_filter::parse_date_input;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

const APP_DIR: &str = "journal-pages";
const JAR_FILE: &str = "cookies.json";
const LOG_FILE: &str = "journal-pages.log";

/// Dated journal pages in the terminal.
#[derive(Debug, Parser)]
#[command(name = "journal-pages", version, about)]
pub struct Config {
    /// Cookie jar file holding the pages
    #[arg(long, env = "JOURNAL_PAGES_JAR")]
    pub jar: Option<PathBuf>,

    /// Start filtered to this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Start in dark mode
    #[arg(long)]
    pub dark: bool,

    /// Reject stored values larger than this many bytes, like a browser cookie
    #[arg(long, env = "JOURNAL_PAGES_MAX_VALUE_BYTES")]
    pub max_value_bytes: Option<usize>,

    /// Where to write logs
    #[arg(long, env = "JOURNAL_PAGES_LOG")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn jar_path(&self) -> PathBuf {
        match &self.jar {
            Some(path) => path.clone(),
            None => match dirs::data_local_dir() {
                Some(dir) => dir.join(APP_DIR).join(JAR_FILE),
                None => PathBuf::from("journal-pages-cookies.json"),
            },
        }
    }

    /// Defaults to a file next to the jar.
    pub fn log_path(&self) -> PathBuf {
        match &self.log_file {
            Some(path) => path.clone(),
            None => self.jar_path().with_file_name(LOG_FILE),
        }
    }
}

fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    match parse_date_input(input) {
        Ok(Some(date)) => Ok(date),
        Ok(None) => Err("date must not be empty".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let config = Config::try_parse_from([
            "journal-pages",
            "--jar",
            "/tmp/jar.json",
            "--date",
            "2024-01-01",
            "--dark",
            "--max-value-bytes",
            "4096",
        ])
        .unwrap();
        assert_eq!(config.jar_path(), PathBuf::from("/tmp/jar.json"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/journal-pages.log"));
        assert_eq!(config.date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(config.dark);
        assert_eq!(config.max_value_bytes, Some(4096));
        assert!(!config.verbose);
    }

    #[test]
    fn help_has_a_description() {
        use clap::CommandFactory;
        let about = Config::command()
            .get_about()
            .map(|about| about.to_string())
            .unwrap_or_default();
        assert!(about.contains("journal pages"), "about was {about:?}");
    }

    #[test]
    fn rejects_bad_date() {
        assert!(Config::try_parse_from(["journal-pages", "--date", "yesterday"]).is_err());
    }

    #[test]
    fn explicit_log_file_wins() {
        let config =
            Config::try_parse_from(["journal-pages", "--jar", "a/b.json", "--log-file", "x.log"])
                .unwrap();
        assert_eq!(config.log_path(), PathBuf::from("x.log"));
    }
}

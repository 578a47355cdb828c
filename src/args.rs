use clap::Parser;

/// Transforms the raw results of the Secretary of State into something ready to publish.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the locations of the raw data, of the transformed
    /// data and of the corrections. See the manual for the format of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, optional) The directory holding the raw snapshots. Every file called
    /// latest.json in this directory or below is transformed. Setting this option overrides
    /// the value from the --config option.
    #[clap(long, value_parser)]
    pub raw_dir: Option<String>,

    /// (directory, optional) The directory in which the timestamped and the latest files are written.
    /// Setting this option overrides the value from the --config option.
    #[clap(long, value_parser)]
    pub transformed_dir: Option<String>,

    /// (file path, optional) The table of corrections, in CSV or in Excel (.xlsx) format.
    /// Setting this option overrides the value from the --config option.
    #[clap(long, value_parser)]
    pub corrections: Option<String>,

    /// (default: first worksheet) When the corrections are in an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub corrections_worksheet: Option<String>,

    /// (file path) A previously transformed file. If provided, the contests must match the ones
    /// of this file (the timestamps are not compared), otherwise nothing is written.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

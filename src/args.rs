use clap::Parser;

/// Builds the case charts and the county statistics table from a census table and a
/// case feed.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON settings file. It describes the chart and the statistics to build, and
    /// may point to the input files. Paths in this file are relative to the file itself.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The census reference table (comma-separated). Setting this option overrides the path
    /// that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub reference_data: Option<String>,

    /// (file path) The case feed in JSON format. Setting this option overrides the path that may be
    /// specified with the --config option.
    #[clap(long, value_parser)]
    pub cases: Option<String>,

    /// (state name or empty) If specified, restricts the chart and the statistics to this state.
    #[clap(short, long, value_parser)]
    pub state: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference report in JSON format. If provided, epicenter will check that the
    /// computed report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

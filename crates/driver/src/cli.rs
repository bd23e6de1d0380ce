//! Argument parsing and usage text (§6, §7).

use clap::Parser;

const USAGE_TEXT: &str = "\
Usage: analyzer <queue_size> <stage1> [stage2] ... [stageN]

Runs a linear pipeline of text-transform stages over stdin, one line at a
time, until a line of exactly `<END>` is read.

Arguments:
  queue_size    Channel capacity shared by every stage (integer >= 1)
  stage...      One or more stage names or paths to stage modules

Built-in stages:
  logger        Logs each line to stdout, unchanged
  uppercaser    Uppercases ASCII letters
  rotator       Right-rotates a line by one byte, with wrap
  flipper       Byte-reverses a line
  expander      Inserts a space between every byte of a line
  typewriter    Paces a line's bytes to stdout with a 100 ms delay between bytes

Options:
  --namespace-isolation <0|1>   Override ANALYZER_NAMESPACE_ISOLATION for
                                this run (0 = classic, anything else = isolated)

Examples:
  analyzer 10 uppercaser logger
  analyzer 20 uppercaser rotator logger flipper typewriter
";

/// Prints the usage text to stdout, per §6: "Destination: standard output."
pub fn print_usage() {
    print!("{USAGE_TEXT}");
}

#[derive(Parser, Debug)]
#[command(name = "analyzer", disable_help_subcommand = true)]
struct RawCli {
    /// Channel capacity shared by every stage; parsed and validated manually
    /// so a missing or invalid value is a *UsageError*, not a clap exit.
    queue_size: Option<String>,

    /// Ordered stage names or paths to dynamically loaded stage modules.
    stages: Vec<String>,

    #[arg(long = "namespace-isolation", value_name = "0|1")]
    namespace_isolation: Option<String>,
}

/// A successfully parsed and validated command line.
pub struct Cli {
    pub queue_size: usize,
    pub stages: Vec<String>,
    pub namespace_isolation_override: Option<String>,
}

/// A *UsageError* (§7): the caller prints `message` to stderr, prints usage
/// to stdout, and exits 1.
pub struct UsageError(pub String);

impl Cli {
    pub fn parse() -> Result<Self, UsageError> {
        let raw = RawCli::try_parse().map_err(|e| UsageError(e.to_string()))?;

        let queue_size = raw
            .queue_size
            .as_deref()
            .ok_or_else(|| UsageError("missing required argument: queue_size".to_string()))?;
        let queue_size: usize = queue_size
            .parse()
            .map_err(|_| UsageError(format!("queue_size must be a non-negative integer, got '{queue_size}'")))?;
        if queue_size < 1 {
            return Err(UsageError(format!("queue_size must be >= 1, got {queue_size}")));
        }

        if raw.stages.is_empty() {
            return Err(UsageError("at least one stage is required".to_string()));
        }

        Ok(Self {
            queue_size,
            stages: raw.stages,
            namespace_isolation_override: raw.namespace_isolation,
        })
    }
}

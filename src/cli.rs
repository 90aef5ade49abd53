//! Command-line entry point surface (spec.md §1, "out of scope" collaborator).
//!
//! Grounded on the teacher's `src/cli.rs` (`clap` `App`/`Arg` builder style).

use clap::{App, Arg};

/// Parsed command-line arguments.
pub struct Args {
    pub instance_path: String,
    pub solution_path: String,
    pub config_path: Option<String>,
    pub max_iterations_without_improvement: Option<u64>,
    pub time_limit_secs: Option<u64>,
}

impl Args {
    /// Sets up the clap app and parses the command line arguments.
    pub fn parse() -> Self {
        let matches = App::new("kgls-cli")
            .version("0.1")
            .about("Knowledge-Guided Local Search solver for the Capacitated Vehicle Routing Problem")
            .arg(
                Arg::with_name("instance_path")
                    .required(true)
                    .help("Path to the problem instance file"),
            )
            .arg(
                Arg::with_name("solution_path")
                    .short("o")
                    .long("output")
                    .takes_value(true)
                    .default_value("output.sol")
                    .help("Path to write the solution file"),
            )
            .arg(
                Arg::with_name("config")
                    .short("c")
                    .long("config")
                    .takes_value(true)
                    .help("YAML file patching the default run parameters"),
            )
            .arg(
                Arg::with_name("iterations")
                    .short("i")
                    .long("iterations")
                    .takes_value(true)
                    .help("Abort after this many iterations without improvement"),
            )
            .arg(
                Arg::with_name("time_limit")
                    .short("t")
                    .long("time-limit")
                    .takes_value(true)
                    .help("Abort after this many seconds"),
            )
            .get_matches();

        let instance_path = matches
            .value_of("instance_path")
            .expect("instance_path is required")
            .to_owned();

        let solution_path = matches
            .value_of("solution_path")
            .expect("solution_path has a default")
            .to_owned();

        let config_path = matches.value_of("config").map(String::from);

        let max_iterations_without_improvement = matches
            .value_of("iterations")
            .map(|value| value.parse::<u64>().expect("invalid --iterations value"));

        let time_limit_secs = matches
            .value_of("time_limit")
            .map(|value| value.parse::<u64>().expect("invalid --time-limit value"));

        Self {
            instance_path,
            solution_path,
            config_path,
            max_iterations_without_improvement,
            time_limit_secs,
        }
    }
}

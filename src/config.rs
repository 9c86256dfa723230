use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::engine::SolveOptions;

/// HTTP service that computes weekly class timetables.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Address the HTTP server listens on.
    #[arg(long, default_value = "127.0.0.1:5001")]
    pub bind: SocketAddr,

    /// Wall clock limit for a single solve, in seconds.
    #[arg(long, default_value = "30", value_parser = parse_seconds)]
    pub time_limit: Duration,

    /// Number of threads HiGHS may use per solve.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=1024))]
    pub threads: u32,

    /// Random seed handed to HiGHS, for reproducible timetables.
    #[arg(long, default_value_t = 1234, value_parser = clap::value_parser!(u32).range(0..=i64::from(i32::MAX)))]
    pub seed: u32,

    /// Print the HiGHS solver log to the console.
    #[arg(long)]
    pub solver_log: bool,
}

impl Cli {
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            time_limit: self.time_limit,
            threads: self.threads,
            random_seed: self.seed,
            log_to_console: self.solver_log,
        }
    }
}

fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let seconds: f64 = arg.parse().map_err(|e| format!("`{arg}` is not a number of seconds: {e}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("`{arg}` is not a usable time limit: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_solver_defaults() {
        let cli = Cli::parse_from(["timetable_solver"]);

        assert_eq!(cli.bind, "127.0.0.1:5001".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.solve_options(), SolveOptions::default());
    }

    #[test]
    fn flags_override_options() {
        let cli = Cli::parse_from([
            "timetable_solver",
            "--bind",
            "0.0.0.0:8080",
            "--time-limit",
            "2.5",
            "--threads",
            "4",
            "--solver-log",
        ]);
        let options = cli.solve_options();

        assert_eq!(cli.bind.port(), 8080);
        assert_eq!(options.time_limit, Duration::from_millis(2500));
        assert_eq!(options.threads, 4);
        assert!(options.log_to_console);
    }

    #[test]
    fn unusable_time_limits_are_rejected() {
        for limit in ["inf", "NaN", "-1", "1e300", "soon"] {
            let parsed = Cli::try_parse_from(["timetable_solver", "--time-limit", limit]);
            assert!(parsed.is_err(), "accepted --time-limit {limit}");
        }
    }

    #[test]
    fn thread_and_seed_values_fit_the_solver() {
        assert!(Cli::try_parse_from(["timetable_solver", "--threads", "0"]).is_err());
        assert!(Cli::try_parse_from(["timetable_solver", "--threads", "4294967295"]).is_err());
        assert!(Cli::try_parse_from(["timetable_solver", "--seed", "2147483648"]).is_err());

        let cli = Cli::try_parse_from(["timetable_solver", "--seed", "2147483647"]).unwrap();
        assert_eq!(cli.solve_options().random_seed, i32::MAX as u32);
    }
}

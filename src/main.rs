use clap::Parser;
use timetable_solver::config::Cli;
use timetable_solver::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    server::run_server(&cli).await
}

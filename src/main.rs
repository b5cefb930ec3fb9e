use student_scheduler::config::ServerConfig;
use student_scheduler::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    server::run_server(ServerConfig::from_env()).await
}

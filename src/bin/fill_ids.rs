use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = xlidfill::run(std::env::args_os()) {
        eprintln!("错误: {err:#}");
        std::process::exit(1);
    }
}

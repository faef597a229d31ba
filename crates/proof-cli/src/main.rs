#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    proof_cli::cli::run("proof")
}

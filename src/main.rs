use mandi::{Config, run};

fn main() -> anyhow::Result<()> {
    // The runtime is sized before it exists, so the config is loaded here
    // and handed to the async entry point.
    let config = Config::load()?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if config.general.worker_threads > 0 {
        builder.worker_threads(config.general.worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(config))
}

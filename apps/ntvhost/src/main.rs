use std::process::ExitCode;

use anyhow::{anyhow, bail};
use ntvhost_core::{Host, HostConfig, NativeModule};
use ntvhost_platform_winit::{run_winit_app, WindowOptions};

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> anyhow::Result<()> {
    // The module receives the full command line, module name included.
    let args: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let Some(module_name) = args.get(1).cloned() else {
        let program = args.first().map(String::as_str).unwrap_or("ntvhost");
        bail!("usage: {program} library_name [ args... ]");
    };

    let config_path = HostConfig::default_path();
    let config = HostConfig::load_or_default(&config_path)?;

    let mut module = NativeModule::load(&module_name, &config.search_paths)?;
    let params = module.init(&args, config.init_hints())?;
    log::info!(
        "ntvhost: running '{}' from '{}'",
        module.name(),
        module.path().display()
    );

    let host = Host::new(module, params);
    let options = WindowOptions {
        title: format!("{} -- {}", config.title, module_name),
    };

    run_winit_app(host, options).map_err(|e| anyhow!("event loop failed: {e}"))?;
    log::info!("ntvhost: '{}' finished", module_name);
    Ok(())
}

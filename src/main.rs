use clap::Parser;
use color_eyre::Result;
use pricedash::{App, AppConfig, AppEvent, Args, ConfigManager, HttpCatalog, Theme};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, config: &AppConfig, theme: Theme) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let catalog = Arc::new(HttpCatalog::new(&config.catalog));
    let mut app = App::new(tx.clone(), catalog, theme);
    if config.debug.enabled {
        app.enable_debug();
    }
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);

    tx.send(AppEvent::FetchCategories)?;
    render(&mut terminal, &mut app)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Keep the spinner moving while a fetch is outstanding.
                if app.is_busy() {
                    app.tick();
                    true
                } else {
                    false
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(pricedash::APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let mut config = AppConfig::load(pricedash::APP_NAME)?;
    config.apply_args(&args);
    config.validate()?;

    let log_path = pricedash::logging::log_file_path(pricedash::APP_NAME)?;
    let env_filter = std::env::var("RUST_LOG").ok();
    let filter = pricedash::logging::build_filter(
        args.log_level.as_deref(),
        env_filter.as_deref(),
        &config.logging.level,
    )?;
    pricedash::logging::init(&log_path, filter)?;
    info!(base_url = %config.catalog.base_url, "starting");

    let theme = Theme::from_config(&config.theme)?;

    let terminal = ratatui::init();
    let result = run(terminal, &config, theme);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// orbview terminal viewer
///
/// Renders a GLB or STL model as shaded ASCII with the bounce, pointer tilt
/// and optional orbiting satellite animation.
/// Controls:
///   - Mouse: Tilt the model toward the pointer
///   - Drag / Arrow Keys: Orbit the camera
///   - WASD: Pan, +/- or scroll: Zoom, R: Reset camera
///   - Q/ESC: Quit
use anyhow::Context;
use clap::Parser;
use orbview_core::Viewer;
use orbview_terminal::cli::Cli;
use orbview_terminal::logging::init_logging;
use orbview_terminal::TerminalApp;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config()).context("failed to open log file")?;

    let config = cli.viewer_config().context("invalid viewer configuration")?;
    let viewer = Viewer::load(config);
    if viewer.scene().model.is_empty() {
        eprintln!(
            "warning: could not load '{}', showing an empty scene",
            viewer.config().model_url
        );
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    let mut app = TerminalApp::new(viewer, cli.fps).context("failed to query terminal size")?;
    app.run().context("terminal session failed")?;

    Ok(())
}

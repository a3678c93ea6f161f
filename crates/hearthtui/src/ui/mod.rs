//! Terminal front end.
//!
//! The UI never talks to the hub directly. It reads the [`Synchronizer`]'s
//! snapshot on every frame, shows [`Notice`](crate::sync::Notice)s as they arrive and spawns
//! refresh and toggle requests so the event loop never waits on the network.

mod app;
mod render;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::debug;
use tracing::info;

pub use app::Action;
pub use app::App;
pub use app::TITLE;
pub use render::draw;
pub use view::display_last_changed;
pub use view::display_name;
pub use view::display_state;
pub use view::render_plain;
pub use view::rows;
pub use view::RowData;
pub use view::Tab;
pub use view::TableView;
pub use view::COLUMNS;

use crate::hub::Hub;
use crate::sync::NoticeReceiver;
use crate::sync::Synchronizer;

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

type Backend = CrosstermBackend<io::Stdout>;

/// Run the interactive UI until the user quits.
///
/// Starts the initial load and the auto-refresh task; both are stopped when
/// this returns.
pub async fn run<H: Hub + 'static>(
    sync: Arc<Synchronizer<H>>,
    mut notices: NoticeReceiver,
    server: String,
    refresh_interval: Duration,
) -> anyhow::Result<()> {
    let mut app = App::new(server);

    let loader = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move {
            sync.connect_and_load().await;
        }
    });
    let auto_refresh = sync.start_auto_refresh(refresh_interval);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &sync, &mut notices).await;

    auto_refresh.abort();
    loader.abort();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop<H: Hub + 'static>(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    sync: &Arc<Synchronizer<H>>,
    notices: &mut NoticeReceiver,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        app.observe(sync.snapshot(), sync.is_loaded(), sync.hub_info());
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            _ = redraw.tick() => {}
            Some(notice) = notices.recv() => {
                app.push_notice(notice);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if dispatch(app.handle_event(event), sync) {
                            info!("Quit requested");
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
        }
    }
}

/// Act on `action`; returns true when the UI should exit
fn dispatch<H: Hub + 'static>(action: Action, sync: &Arc<Synchronizer<H>>) -> bool {
    match action {
        Action::None => false,
        Action::Quit => true,
        Action::Refresh => {
            let sync = Arc::clone(sync);
            tokio::spawn(async move {
                let outcome = sync.refresh().await;
                debug!("Manual refresh: {:?}", outcome);
            });
            false
        }
        Action::Toggle(entity_id) => {
            let sync = Arc::clone(sync);
            tokio::spawn(async move {
                let outcome = sync.toggle_entity(&entity_id).await;
                debug!("Toggle {}: {:?}", entity_id, outcome);
            });
            false
        }
    }
}

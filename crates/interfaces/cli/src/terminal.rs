//! Terminal renderers for the monitor view.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use tracing::debug;

use occuview_client::CapacityView;

/// How long the capacity figure stays highlighted after a change.
const PULSE_DURATION: Duration = Duration::from_millis(600);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct StatusLine {
    capacity: Option<i64>,
    visualisation: Option<String>,
    pulsing: bool,
    pulse_generation: u64,
}

impl StatusLine {
    fn render(&self) -> String {
        let capacity = self
            .capacity
            .map(|c| format!(" {c} "))
            .unwrap_or_else(|| " - ".to_string());
        let capacity = if self.pulsing {
            capacity.bold().reverse().to_string()
        } else {
            capacity.bold().to_string()
        };
        let visualisation = self.visualisation.as_deref().unwrap_or("-");
        format!("capacity{capacity} visualisation [{visualisation}]")
    }
}

/// Single status line redrawn in place whenever the monitor reports a change.
#[derive(Debug, Clone, Default)]
pub struct TerminalCapacityView {
    line: Arc<Mutex<StatusLine>>,
}

impl TerminalCapacityView {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StatusLine> {
        self.line.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn redraw(line: &StatusLine) {
        let mut out = io::stdout().lock();
        let queued = queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line.render())
        );
        if let Err(err) = queued.and_then(|()| out.flush()) {
            debug!(?err, "status line redraw failed");
        }
    }

    /// Drop the highlight once the pulse has played, unless a newer pulse
    /// started in the meantime.
    fn schedule_pulse_end(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let line = Arc::clone(&self.line);
        runtime.spawn(async move {
            tokio::time::sleep(PULSE_DURATION).await;
            let mut state = line.lock().unwrap_or_else(PoisonError::into_inner);
            if state.pulsing && state.pulse_generation == generation {
                state.pulsing = false;
                Self::redraw(&state);
            }
        });
    }
}

impl CapacityView for TerminalCapacityView {
    fn show_capacity(&self, capacity: i64) {
        let mut state = self.state();
        state.capacity = Some(capacity);
        Self::redraw(&state);
    }

    fn pulse(&self) {
        let generation = {
            let mut state = self.state();
            state.pulsing = true;
            state.pulse_generation += 1;
            Self::redraw(&state);
            state.pulse_generation
        };
        self.schedule_pulse_end(generation);
    }

    fn show_visualisation(&self, key: &str) {
        let mut state = self.state();
        state.visualisation = Some(key.to_string());
        Self::redraw(&state);
    }
}

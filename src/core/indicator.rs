use super::Shared;
use crate::command::LauncherCommand;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Realizes the blinking indicator modes by toggling the light on a timer
pub(super) fn run(shared: Arc<Shared>) {
    debug!("Indicator worker running");

    loop {
        let interval = {
            let inner = shared.inner.lock();
            if inner.shutdown {
                break;
            }
            shared.settings.blink_interval(inner.state.indicator_mode)
        };

        thread::sleep(interval);

        let mut inner = shared.inner.lock();
        if inner.shutdown {
            break;
        }
        if inner.state.indicator_mode.is_blinking() {
            inner.state.indicator_on = !inner.state.indicator_on;
            let command = if inner.state.indicator_on {
                LauncherCommand::IndicatorOn
            } else {
                LauncherCommand::IndicatorOff
            };
            inner.write(command);
        }
    }

    debug!("Indicator worker exited");
}

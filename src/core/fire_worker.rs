use super::{Inner, Shared};
use crate::command::LauncherCommand;
use crate::feedback::SentryNotification;
use parking_lot::MutexGuard;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Fire/move worker loop.
///
/// The only thread that blocks for hardware-timed work. It always derives
/// what to do from the state it finds after waking, so extra or merged wakes
/// are harmless.
pub(super) fn run(shared: Arc<Shared>) {
    debug!("Fire/move worker running");
    let mut inner = shared.inner.lock();

    loop {
        while !inner.state.wake_pending && !inner.shutdown {
            shared.wake.wait(&mut inner);
        }
        if inner.shutdown {
            break;
        }

        fire_bursts(&shared, &mut inner);
        if inner.shutdown {
            break;
        }

        // Wakes that arrived during a burst are covered by this dispatch
        inner.state.wake_pending = false;
        let command = inner.state.desired_movement.command();
        inner.write(command);
    }

    debug!("Fire/move worker exited");
}

fn fire_bursts(shared: &Shared, inner: &mut MutexGuard<'_, Inner>) {
    let mut fired = false;

    while inner.state.continue_firing && inner.state.remaining_shots > 0 && !inner.shutdown {
        inner.write(LauncherCommand::Fire);
        fired = true;

        // Dispatch stays responsive while the launcher cycles
        MutexGuard::unlocked(inner, || thread::sleep(shared.settings.burst_duration));

        inner.state.remaining_shots = inner.state.remaining_shots.saturating_sub(1);
        let remaining = inner.state.remaining_shots;
        debug!("Burst complete, {} shots remaining", remaining);
        inner.notify(SentryNotification::shot_fired(remaining));
    }

    if inner.state.continue_firing && inner.state.remaining_shots == 0 && !inner.shutdown {
        if fired {
            info!("Magazine emptied while firing");
        }
        warn!("Out of ammo");
        inner.state.continue_firing = false;
        inner.notify(SentryNotification::out_of_ammo());
    }
}

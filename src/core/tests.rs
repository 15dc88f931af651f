use super::*;
use crate::events::{ControlEvent, FaceBox, FaceEvent, Movement};
use crate::launcher::ChannelSink;
use crossbeam::channel::Receiver;
use std::time::Instant;
use tokio::sync::broadcast;

fn test_settings() -> CoreSettings {
    CoreSettings {
        burst_duration: Duration::from_millis(30),
        slow_blink: Duration::from_millis(20),
        fast_blink: Duration::from_millis(10),
        idle_poll: Duration::from_millis(20),
        ..CoreSettings::default()
    }
}

fn create_test_core() -> (Core, Receiver<LauncherCommand>, FeedbackBus) {
    let (sink, receiver) = ChannelSink::new();
    let feedback = FeedbackBus::new(64);
    let core = Core::new(test_settings(), sink, feedback.clone());
    (core, receiver, feedback)
}

fn centered_face() -> FaceEvent {
    FaceEvent::new(vec![FaceBox::new(145, 105, 30, 30)])
}

fn left_face() -> FaceEvent {
    FaceEvent::new(vec![FaceBox::new(0, 110, 20, 20)])
}

/// Collect commands until nothing arrives for `quiet`
fn collect_until_quiet(receiver: &Receiver<LauncherCommand>, quiet: Duration) -> Vec<LauncherCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = receiver.recv_timeout(quiet) {
        commands.push(command);
    }
    commands
}

/// Collect commands for a fixed window
fn collect_for(receiver: &Receiver<LauncherCommand>, window: Duration) -> Vec<LauncherCommand> {
    let deadline = Instant::now() + window;
    let mut commands = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match receiver.recv_timeout(remaining) {
            Ok(command) => commands.push(command),
            Err(_) => break,
        }
    }
    commands
}

fn wait_for(receiver: &Receiver<LauncherCommand>, wanted: LauncherCommand) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match receiver.recv_timeout(remaining) {
            Ok(command) if command == wanted => return true,
            Ok(_) => continue,
            Err(_) => return false,
        }
    }
    false
}

fn without_indicator(commands: Vec<LauncherCommand>) -> Vec<LauncherCommand> {
    commands
        .into_iter()
        .filter(|c| !matches!(c, LauncherCommand::IndicatorOn | LauncherCommand::IndicatorOff))
        .collect()
}

fn drain_notifications(
    receiver: &mut broadcast::Receiver<SentryNotification>,
) -> Vec<SentryNotification> {
    let mut notifications = Vec::new();
    while let Ok(notification) = receiver.try_recv() {
        notifications.push(notification);
    }
    notifications
}

fn assert_invariants(state: &CoreState, max_shots: u8) {
    assert!(state.remaining_shots <= max_shots);
    if !state.moving {
        assert_eq!(state.desired_movement, Movement::None, "{:?}", state);
    } else {
        assert_ne!(state.desired_movement, Movement::None, "{:?}", state);
    }
}

fn stop(core: &Core, workers: Workers) {
    core.shutdown();
    workers.join().unwrap();
}

#[test]
fn test_settings_from_oversized_config_saturate() {
    let mut config = crate::config::SentryConfig::default();
    config.camera.resolution = (u32::MAX, 240);
    config.targeting.deadzone_radius = u32::MAX;

    let settings = CoreSettings::from(&config);
    assert_eq!(settings.targeting.frame_width, i32::MAX);
    assert_eq!(settings.targeting.frame_height, 240);
    assert_eq!(settings.targeting.deadzone_radius, i32::MAX);
}

#[test]
fn test_initial_state() {
    let (core, receiver, _) = create_test_core();
    let state = core.snapshot();

    assert_eq!(state, CoreState::new(4));
    assert!(receiver.try_recv().is_err());
}

#[test]
fn test_face_event_ignored_while_sentry_off() {
    let (core, receiver, _) = create_test_core();
    let before = core.snapshot();

    core.dispatch(left_face());
    core.dispatch(centered_face());
    core.dispatch(FaceEvent::empty());

    assert_eq!(core.snapshot(), before);
    assert!(receiver.try_recv().is_err());
}

#[test]
fn test_mode_toggle_enters_and_leaves_sentry() {
    let (core, receiver, feedback) = create_test_core();
    let mut notifications = feedback.subscribe();

    core.dispatch(ControlEvent::ModeToggle);
    let state = core.snapshot();
    assert_eq!(state.sentry_mode, SentryMode::Passive);
    assert_eq!(state.indicator_mode, IndicatorMode::BlinkSlow);

    core.dispatch(ControlEvent::ModeToggle);
    let state = core.snapshot();
    assert_eq!(state.sentry_mode, SentryMode::Off);
    assert_eq!(state.indicator_mode, IndicatorMode::Off);
    assert_eq!(receiver.try_recv().unwrap(), LauncherCommand::IndicatorOff);

    let changes: Vec<_> = drain_notifications(&mut notifications)
        .into_iter()
        .filter_map(|n| match n {
            SentryNotification::SentryModeChanged { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (SentryMode::Off, SentryMode::Passive),
            (SentryMode::Passive, SentryMode::Off)
        ]
    );
}

#[test]
fn test_sentry_mode_toggle_ignored_while_off() {
    let (core, receiver, feedback) = create_test_core();
    let mut notifications = feedback.subscribe();
    let before = core.snapshot();

    core.dispatch(ControlEvent::SentryModeToggle);

    assert_eq!(core.snapshot(), before);
    assert!(receiver.try_recv().is_err());
    assert!(drain_notifications(&mut notifications).is_empty());
}

#[test]
fn test_sentry_mode_toggle_arms_and_disarms() {
    let (core, _receiver, _) = create_test_core();

    core.dispatch(ControlEvent::ModeToggle);
    core.dispatch(ControlEvent::SentryModeToggle);
    assert_eq!(core.snapshot().sentry_mode, SentryMode::Armed);

    core.dispatch(ControlEvent::FireBegin);
    core.dispatch(ControlEvent::SentryModeToggle);
    let state = core.snapshot();
    assert_eq!(state.sentry_mode, SentryMode::Passive);
    assert!(!state.continue_firing);
}

#[test]
fn test_indicator_toggle_writes_solid_states_only() {
    let (core, receiver, _) = create_test_core();

    let mut modes = Vec::new();
    for _ in 0..4 {
        core.dispatch(ControlEvent::IndicatorToggle);
        modes.push(core.snapshot().indicator_mode);
    }

    assert_eq!(
        modes,
        vec![
            IndicatorMode::On,
            IndicatorMode::BlinkSlow,
            IndicatorMode::BlinkFast,
            IndicatorMode::Off
        ]
    );
    assert_eq!(
        receiver.try_iter().collect::<Vec<_>>(),
        vec![LauncherCommand::IndicatorOn, LauncherCommand::IndicatorOff]
    );
}

#[test]
fn test_fire_end_is_idempotent() {
    let (once, _r1, _) = create_test_core();
    let (twice, _r2, _) = create_test_core();

    for core in [&once, &twice] {
        core.dispatch(ControlEvent::FireBegin);
        core.dispatch(ControlEvent::FireEnd);
    }
    twice.dispatch(ControlEvent::FireEnd);

    assert!(!once.snapshot().continue_firing);
    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn test_move_sets_desired_movement_and_requests_work() {
    let (core, _receiver, _) = create_test_core();

    core.dispatch(ControlEvent::Move(Movement::Up));
    let state = core.snapshot();
    assert_eq!(state.desired_movement, Movement::Up);
    assert!(state.moving);
    assert!(state.wake_pending);

    core.dispatch(ControlEvent::Move(Movement::None));
    let state = core.snapshot();
    assert_eq!(state.desired_movement, Movement::None);
    assert!(!state.moving);
}

#[test]
fn test_last_move_wins_before_worker_wakes() {
    let (core, receiver, _) = create_test_core();

    core.dispatch(ControlEvent::Move(Movement::Left));
    core.dispatch(ControlEvent::Move(Movement::Right));
    assert!(receiver.try_recv().is_err());

    let workers = core.spawn_workers().unwrap();
    let commands = collect_for(&receiver, Duration::from_millis(200));
    stop(&core, workers);

    assert_eq!(commands, vec![LauncherCommand::Right]);
}

#[test]
fn test_off_center_face_moves_toward_target() {
    let (core, receiver, _) = create_test_core();
    core.dispatch(ControlEvent::ModeToggle);

    core.dispatch(left_face());
    let state = core.snapshot();
    assert_eq!(state.desired_movement, Movement::Left);
    assert!(state.moving);
    assert!(state.tracking_face);
    assert_eq!(state.indicator_mode, IndicatorMode::BlinkFast);

    let workers = core.spawn_workers().unwrap();
    assert!(wait_for(&receiver, LauncherCommand::Left));
    stop(&core, workers);
}

#[test]
fn test_repeated_face_events_do_not_repeat_movement() {
    let (core, receiver, _) = create_test_core();
    core.dispatch(ControlEvent::ModeToggle);
    let workers = core.spawn_workers().unwrap();

    core.dispatch(left_face());
    assert!(wait_for(&receiver, LauncherCommand::Left));

    for _ in 0..5 {
        core.dispatch(left_face());
    }
    let commands = without_indicator(collect_for(&receiver, Duration::from_millis(150)));
    stop(&core, workers);

    assert!(commands.is_empty(), "unexpected commands: {:?}", commands);
}

#[test]
fn test_empty_face_event_stops_tracking() {
    let (core, receiver, _) = create_test_core();
    core.dispatch(ControlEvent::ModeToggle);
    let workers = core.spawn_workers().unwrap();

    core.dispatch(left_face());
    assert!(wait_for(&receiver, LauncherCommand::Left));

    core.dispatch(FaceEvent::empty());
    let state = core.snapshot();
    assert!(!state.tracking_face);
    assert!(!state.moving);
    assert_eq!(state.desired_movement, Movement::None);
    assert_eq!(state.indicator_mode, IndicatorMode::BlinkSlow);

    // A second empty frame has nothing left to stop
    core.dispatch(FaceEvent::empty());

    let commands = without_indicator(collect_for(&receiver, Duration::from_millis(200)));
    stop(&core, workers);

    assert_eq!(commands, vec![LauncherCommand::Stop]);
}

#[test]
fn test_centered_face_in_passive_mode_stops_without_firing() {
    let (core, receiver, _) = create_test_core();
    core.dispatch(ControlEvent::ModeToggle);
    let workers = core.spawn_workers().unwrap();

    core.dispatch(left_face());
    assert!(wait_for(&receiver, LauncherCommand::Left));

    core.dispatch(centered_face());
    let state = core.snapshot();
    assert_eq!(state.indicator_mode, IndicatorMode::On);
    assert!(!state.continue_firing);
    assert!(!state.moving);

    let commands = without_indicator(collect_for(&receiver, Duration::from_millis(200)));
    stop(&core, workers);

    assert_eq!(commands, vec![LauncherCommand::Stop]);
}

#[test]
fn test_centered_face_in_armed_mode_fires_until_empty() {
    let (core, receiver, feedback) = create_test_core();
    let mut notifications = feedback.subscribe();
    core.dispatch(ControlEvent::ModeToggle);
    core.dispatch(ControlEvent::SentryModeToggle);
    let workers = core.spawn_workers().unwrap();

    core.dispatch(left_face());
    assert!(wait_for(&receiver, LauncherCommand::Left));

    core.dispatch(centered_face());
    let commands = without_indicator(collect_until_quiet(&receiver, Duration::from_millis(200)));
    let state = core.snapshot();
    stop(&core, workers);

    assert_eq!(
        commands,
        vec![
            LauncherCommand::Fire,
            LauncherCommand::Fire,
            LauncherCommand::Fire,
            LauncherCommand::Fire,
            LauncherCommand::Stop
        ]
    );
    assert_eq!(state.remaining_shots, 0);
    assert!(!state.continue_firing);
    assert_eq!(state.indicator_mode, IndicatorMode::On);

    let out_of_ammo = drain_notifications(&mut notifications)
        .iter()
        .filter(|n| n.notification_type() == "out_of_ammo")
        .count();
    assert_eq!(out_of_ammo, 1);
}

#[test]
fn test_off_center_face_cancels_firing() {
    let (core, _receiver, _) = create_test_core();
    core.dispatch(ControlEvent::ModeToggle);
    core.dispatch(ControlEvent::FireBegin);
    assert!(core.snapshot().continue_firing);

    core.dispatch(left_face());
    assert!(!core.snapshot().continue_firing);
}

#[test]
fn test_ammo_exhaustion_notifies_once() {
    let (core, receiver, feedback) = create_test_core();
    let mut notifications = feedback.subscribe();
    core.shared.inner.lock().state.remaining_shots = 1;
    let workers = core.spawn_workers().unwrap();

    core.dispatch(ControlEvent::FireBegin);
    let commands = collect_until_quiet(&receiver, Duration::from_millis(200));

    let state = core.snapshot();
    assert_eq!(state.remaining_shots, 0);
    assert!(!state.continue_firing);
    assert_eq!(commands, vec![LauncherCommand::Fire, LauncherCommand::Stop]);

    // Later wakes must not fire or repeat the notification
    core.dispatch(ControlEvent::Move(Movement::Down));
    let commands = collect_until_quiet(&receiver, Duration::from_millis(150));
    stop(&core, workers);
    assert_eq!(commands, vec![LauncherCommand::Down]);

    let types: Vec<_> = drain_notifications(&mut notifications)
        .iter()
        .map(|n| n.notification_type())
        .collect();
    assert_eq!(types, vec!["shot_fired", "out_of_ammo"]);
}

#[test]
fn test_trigger_on_empty_magazine_reports_out_of_ammo() {
    let (core, receiver, feedback) = create_test_core();
    let mut notifications = feedback.subscribe();
    core.shared.inner.lock().state.remaining_shots = 0;
    let workers = core.spawn_workers().unwrap();

    core.dispatch(ControlEvent::FireBegin);
    let commands = collect_until_quiet(&receiver, Duration::from_millis(150));
    stop(&core, workers);

    assert_eq!(commands, vec![LauncherCommand::Stop]);
    assert!(drain_notifications(&mut notifications)
        .iter()
        .any(|n| n.notification_type() == "out_of_ammo"));
}

#[test]
fn test_reload_restores_capacity() {
    let (core, _receiver, feedback) = create_test_core();
    let mut notifications = feedback.subscribe();
    core.shared.inner.lock().state.remaining_shots = 0;

    core.dispatch(ControlEvent::Reload);

    let state = core.snapshot();
    assert_eq!(state.remaining_shots, 4);
    assert!(state.wake_pending);
    assert!(matches!(
        drain_notifications(&mut notifications).as_slice(),
        [SentryNotification::Reloaded {
            remaining_shots: 4,
            ..
        }]
    ));
}

#[test]
fn test_failed_writes_do_not_stop_the_burst() {
    let (sink, receiver) = ChannelSink::failing();
    let feedback = FeedbackBus::new(64);
    let mut notifications = feedback.subscribe();
    let core = Core::new(test_settings(), sink, feedback);
    core.shared.inner.lock().state.remaining_shots = 2;
    let workers = core.spawn_workers().unwrap();

    core.dispatch(ControlEvent::FireBegin);
    let commands = collect_until_quiet(&receiver, Duration::from_millis(200));
    let state = core.snapshot();
    stop(&core, workers);

    assert_eq!(
        commands,
        vec![LauncherCommand::Fire, LauncherCommand::Fire, LauncherCommand::Stop]
    );
    assert_eq!(state.remaining_shots, 0);

    let failures = drain_notifications(&mut notifications)
        .iter()
        .filter(|n| n.notification_type() == "command_failed")
        .count();
    assert!(failures >= 3);
}

#[test]
fn test_fire_end_during_burst_stops_after_current_cycle() {
    let mut settings = test_settings();
    settings.burst_duration = Duration::from_millis(150);
    let (sink, receiver) = ChannelSink::new();
    let core = Core::new(settings, sink, FeedbackBus::new(16));
    let workers = core.spawn_workers().unwrap();

    core.dispatch(ControlEvent::FireBegin);
    assert!(wait_for(&receiver, LauncherCommand::Fire));
    core.dispatch(ControlEvent::FireEnd);
    core.dispatch(ControlEvent::Move(Movement::Left));

    let commands = collect_until_quiet(&receiver, Duration::from_millis(300));
    let state = core.snapshot();
    stop(&core, workers);

    assert_eq!(commands, vec![LauncherCommand::Left]);
    assert_eq!(state.remaining_shots, 3);
}

#[test]
fn test_indicator_worker_blinks() {
    let (core, receiver, _) = create_test_core();

    core.dispatch(ControlEvent::IndicatorToggle);
    core.dispatch(ControlEvent::IndicatorToggle);
    assert_eq!(receiver.try_recv().unwrap(), LauncherCommand::IndicatorOn);

    let workers = core.spawn_workers().unwrap();
    let commands = collect_for(&receiver, Duration::from_millis(200));
    stop(&core, workers);

    assert!(commands.len() >= 2, "expected blinking, got {:?}", commands);
    assert_eq!(commands[0], LauncherCommand::IndicatorOff);
    assert_eq!(commands[1], LauncherCommand::IndicatorOn);
}

#[test]
fn test_solid_indicator_is_not_rewritten_by_worker() {
    let (core, receiver, _) = create_test_core();
    core.dispatch(ControlEvent::IndicatorToggle);
    assert_eq!(receiver.try_recv().unwrap(), LauncherCommand::IndicatorOn);

    let workers = core.spawn_workers().unwrap();
    let commands = collect_for(&receiver, Duration::from_millis(100));
    stop(&core, workers);

    assert!(commands.is_empty());
}

#[test]
fn test_indicator_phase_mirrors_solid_writes() {
    let (core, receiver, _) = create_test_core();

    core.dispatch(ControlEvent::IndicatorToggle);
    assert_eq!(core.snapshot().indicator_mode, IndicatorMode::On);
    assert!(core.snapshot().indicator_on);

    core.shutdown();
    assert!(!core.snapshot().indicator_on);
    assert_eq!(
        receiver.try_iter().collect::<Vec<_>>(),
        vec![
            LauncherCommand::IndicatorOn,
            LauncherCommand::Stop,
            LauncherCommand::IndicatorOff
        ]
    );
}

#[test]
fn test_shutdown_halts_hardware_and_joins_workers() {
    let (core, receiver, _) = create_test_core();
    let workers = core.spawn_workers().unwrap();

    core.shutdown();
    workers.join().unwrap();

    assert_eq!(
        receiver.try_iter().collect::<Vec<_>>(),
        vec![LauncherCommand::Stop, LauncherCommand::IndicatorOff]
    );

    let before = core.snapshot();
    core.dispatch(ControlEvent::Move(Movement::Up));
    assert_eq!(core.snapshot(), before);

    // Shutting down twice is harmless
    core.shutdown();
    assert!(receiver.try_recv().is_err());
}

#[test]
fn test_invariants_hold_over_event_sequence() {
    let (core, _receiver, _) = create_test_core();
    let max_shots = core.settings().max_shots;

    let sequence: Vec<crate::events::Event> = vec![
        ControlEvent::Move(Movement::Left).into(),
        ControlEvent::ModeToggle.into(),
        left_face().into(),
        FaceEvent::new(vec![FaceBox::new(150, 10, 10, 10)]).into(),
        centered_face().into(),
        ControlEvent::SentryModeToggle.into(),
        left_face().into(),
        centered_face().into(),
        FaceEvent::empty().into(),
        ControlEvent::Reload.into(),
        ControlEvent::Move(Movement::Down).into(),
        left_face().into(),
        ControlEvent::ModeToggle.into(),
        ControlEvent::FireBegin.into(),
        ControlEvent::Move(Movement::None).into(),
        ControlEvent::FireEnd.into(),
        ControlEvent::Reload.into(),
    ];

    for _ in 0..3 {
        for event in &sequence {
            core.dispatch(event.clone());
            assert_invariants(&core.snapshot(), max_shots);
        }
    }
}

#[test]
fn test_concurrent_producers_keep_state_consistent() {
    let (core, receiver, _) = create_test_core();
    core.dispatch(ControlEvent::ModeToggle);
    let workers = core.spawn_workers().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|i| {
            let core = core.clone();
            std::thread::spawn(move || {
                for n in 0..50 {
                    match (i + n) % 4 {
                        0 => core.dispatch(left_face()),
                        1 => core.dispatch(centered_face()),
                        2 => core.dispatch(ControlEvent::Move(Movement::Up)),
                        _ => core.dispatch(FaceEvent::empty()),
                    }
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    assert_invariants(&core.snapshot(), core.settings().max_shots);
    stop(&core, workers);
    drop(receiver);
}

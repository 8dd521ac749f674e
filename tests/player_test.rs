// Integration tests driving the public surface end-to-end: registry
// resolution, playback lifecycle, global controls and backend
// notifications, against a scripted in-memory backend.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use soundstage::registry::{initialize, shutdown};
use soundstage::{
    AudioBackend, AudioError, Channel, ChannelEvent, MemoryRegistry, PlayOptions, PlaybackState,
    ResourceRegistry, SoundData, SoundPlayer,
};

#[derive(Default)]
struct ChannelProbe {
    started: bool,
    paused: bool,
    stopped: bool,
    volume: f32,
    events: VecDeque<ChannelEvent>,
}

struct ScriptedChannel {
    probe: Arc<Mutex<ChannelProbe>>,
}

impl Channel for ScriptedChannel {
    fn start(&mut self) {
        self.probe.lock().started = true;
    }
    fn pause(&mut self) {
        self.probe.lock().paused = true;
    }
    fn resume(&mut self) {
        self.probe.lock().paused = false;
    }
    fn stop(&mut self) {
        self.probe.lock().stopped = true;
    }
    fn seek(&mut self, _offset_ms: u64) {}
    fn set_pitch(&mut self, _pitch: f32) {}
    fn set_volume(&mut self, volume: f32) {
        self.probe.lock().volume = volume;
    }
    fn set_loop(&mut self, _looped: bool) {}
    fn poll_event(&mut self) -> Option<ChannelEvent> {
        self.probe.lock().events.pop_front()
    }
}

#[derive(Default)]
struct ScriptedBackend {
    channels: Mutex<Vec<Arc<Mutex<ChannelProbe>>>>,
}

impl ScriptedBackend {
    fn probe(&self, index: usize) -> Arc<Mutex<ChannelProbe>> {
        self.channels.lock()[index].clone()
    }
}

impl AudioBackend for ScriptedBackend {
    fn open(&self, _sound: &SoundData) -> Result<Box<dyn Channel>, AudioError> {
        let probe = Arc::new(Mutex::new(ChannelProbe::default()));
        self.channels.lock().push(probe.clone());
        Ok(Box::new(ScriptedChannel { probe }))
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("soundstage=debug")
        .with_test_writer()
        .try_init();
}

fn make_registry() -> Arc<MemoryRegistry> {
    let registry = Arc::new(MemoryRegistry::new());
    initialize(registry.as_ref());
    registry
}

fn make_player() -> (SoundPlayer, Arc<ScriptedBackend>) {
    init_logging();
    let backend = Arc::new(ScriptedBackend::default());
    (SoundPlayer::new(backend.clone()), backend)
}

#[test]
fn test_full_playback_lifecycle_by_id() {
    let (player, backend) = make_player();
    let registry = make_registry();
    registry.insert("beep", vec![0u8; 64]).unwrap();
    player.set_registry(registry);

    let handle = player.play_id("beep", &PlayOptions::default()).unwrap();
    assert_eq!(handle.id(), "beep");
    assert_eq!(handle.state(), PlaybackState::Playing);
    assert_eq!(player.active_count(), 1);
    assert!(backend.probe(0).lock().started);

    handle.pause();
    assert_eq!(handle.state(), PlaybackState::Paused);
    assert!(backend.probe(0).lock().paused);

    handle.resume();
    assert_eq!(handle.state(), PlaybackState::Playing);
    assert!(!backend.probe(0).lock().paused);

    handle.stop();
    assert_eq!(handle.state(), PlaybackState::Ended);
    assert_eq!(player.active_count(), 0);
    assert!(backend.probe(0).lock().stopped);
}

#[test]
fn test_unknown_id_yields_no_instance() {
    let (player, _backend) = make_player();
    player.set_registry(make_registry());

    assert!(player.play_id("missing", &PlayOptions::default()).is_none());
    assert_eq!(player.active_count(), 0);
}

#[test]
fn test_registry_hook_can_be_torn_down() {
    let registry = MemoryRegistry::new();
    initialize(&registry);
    registry.insert("beep", vec![1u8]).unwrap();

    shutdown(&registry);
    assert!(registry.insert("boop", vec![1u8]).is_err());

    // Already-built sounds still resolve after teardown
    assert!(registry.resolve("beep").is_some());
}

#[test]
fn test_finished_notification_reaps_on_next_update() {
    let (player, backend) = make_player();
    let handle = player
        .play(&SoundData::new("beep", vec![1u8]), &PlayOptions::default())
        .unwrap();

    backend
        .probe(0)
        .lock()
        .events
        .push_back(ChannelEvent::Finished);
    player.update();

    assert_eq!(handle.state(), PlaybackState::Ended);
    assert_eq!(player.active_count(), 0);
}

#[test]
fn test_fade_in_settles_into_playing() {
    let (player, backend) = make_player();
    let handle = player
        .play(
            &SoundData::new("music", vec![1u8]),
            &PlayOptions::default().with_fade_in(50),
        )
        .unwrap();
    assert_eq!(handle.state(), PlaybackState::FadingIn);
    assert_eq!(backend.probe(0).lock().volume, 0.0);

    std::thread::sleep(Duration::from_millis(120));
    player.update();

    assert_eq!(handle.state(), PlaybackState::Playing);
    assert_eq!(backend.probe(0).lock().volume, 1.0);
}

#[test]
fn test_global_controls_cover_every_sound() {
    let (player, backend) = make_player();
    let a = player
        .play(&SoundData::new("a", vec![1u8]), &PlayOptions::default())
        .unwrap();
    let b = player
        .play(&SoundData::new("b", vec![1u8]), &PlayOptions::default())
        .unwrap();

    player.set_volume(0.5);
    assert_eq!(backend.probe(0).lock().volume, 0.5);
    assert_eq!(backend.probe(1).lock().volume, 0.5);

    player.pause();
    assert!(player.is_paused());
    assert_eq!(a.state(), PlaybackState::Paused);
    assert_eq!(b.state(), PlaybackState::Paused);

    player.resume();
    assert_eq!(a.state(), PlaybackState::Playing);
    assert_eq!(b.state(), PlaybackState::Playing);

    player.fade_out(30);
    assert_eq!(a.state(), PlaybackState::FadingOut);

    std::thread::sleep(Duration::from_millis(80));
    player.update();
    assert_eq!(a.state(), PlaybackState::Ended);
    assert_eq!(b.state(), PlaybackState::Ended);
    assert_eq!(player.active_count(), 0);
}

#[test]
fn test_dormant_start_joins_on_resume() {
    let (player, _backend) = make_player();
    let handle = player
        .play(
            &SoundData::new("beep", vec![1u8]),
            &PlayOptions::default().with_start_paused(true),
        )
        .unwrap();

    assert_eq!(handle.state(), PlaybackState::Created);
    assert_eq!(player.active_count(), 0);

    handle.play();
    assert_eq!(handle.state(), PlaybackState::Playing);
    assert_eq!(player.active_count(), 1);
}

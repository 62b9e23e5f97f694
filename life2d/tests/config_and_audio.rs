use image::Rgba;
use life2d::{AudioError, AudioManager, AudioProps, Vector2, World, WorldConfig};

#[test]
fn config_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.json");

    let config = WorldConfig::default()
        .with_title("Cave")
        .with_size(320, 240)
        .with_gravity(0.0, 160.0)
        .with_background(Rgba([1, 2, 3, 255]))
        .with_fixed_timestep(1.0 / 30.0);
    config.save_to_file(&path).unwrap();

    let loaded = WorldConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.background_color(), Rgba([1, 2, 3, 255]));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WorldConfig::load_from_file(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn world_gravity_is_converted_to_meters() {
    let world = World::new(
        WorldConfig::default().with_gravity(0.0, 80.0),
        AudioManager::default(),
    );
    assert_eq!(world.physics().gravity(), Vector2::new(0.0, 10.0));
}

#[test]
fn world_audio_reports_resource_faults() {
    let mut world = World::new(
        WorldConfig::default().with_audio(AudioProps {
            sound_volume: 0.0,
            ..AudioProps::default()
        }),
        AudioManager::silent(AudioProps {
            sound_volume: 0.0,
            ..AudioProps::default()
        }),
    );

    assert!(matches!(
        world.play_sound("coin.wav"),
        Err(AudioError::SoundNotFound(_))
    ));
    assert!(matches!(
        world.audio_mut().load_sound("coin.aiff", vec![0u8; 8]),
        Err(AudioError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        world.play_music("theme.ogg", true),
        Err(AudioError::MusicNotFound(_))
    ));
    assert!(!world.audio().is_available());
}

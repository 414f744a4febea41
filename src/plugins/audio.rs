//! Audio: the level theme and sound effects driven by gameplay events.
//!
//! Every sound is optional: when the audio collection failed to load the
//! observers simply stay silent.

use bevy::prelude::*;
use bevy_kira_audio::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::data::{MagicKind, MonsterKind};
use crate::events::{EnemyAttacked, EnemyHit, EnemyKilled, SpellFired, WeaponSwung};
use crate::resources::AudioAssets;

#[derive(Resource)]
pub struct MusicChannel;

#[derive(Resource)]
pub struct SfxChannel;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_audio_channel::<MusicChannel>()
            .add_audio_channel::<SfxChannel>();

        app.add_systems(OnEnter(AppState::InGame), start_music);
        app.add_systems(OnExit(AppState::InGame), stop_music);

        app.add_observer(on_weapon_swung);
        app.add_observer(on_spell_fired);
        app.add_observer(on_enemy_attacked);
        app.add_observer(on_enemy_hit);
        app.add_observer(on_enemy_killed);
    }
}

/// Which enemy attack sound a monster makes.
pub fn attack_sound(assets: &AudioAssets, monster: MonsterKind) -> Handle<AudioSource> {
    match monster {
        MonsterKind::Spirit => assets.enemy_fireball.clone(),
        MonsterKind::Slime => assets.enemy_slash.clone(),
        _ => assets.enemy_claw.clone(),
    }
}

// ---------------------------------------------------------------------------
// Music
// ---------------------------------------------------------------------------

#[span_fn]
fn start_music(music: Res<AudioChannel<MusicChannel>>, assets: Option<Res<AudioAssets>>) {
    let Some(assets) = assets else {
        warn!("audio assets unavailable; playing without sound");
        return;
    };
    music.play(assets.main_theme.clone()).looped();
}

#[span_fn]
fn stop_music(music: Res<AudioChannel<MusicChannel>>) {
    music.stop();
}

// ---------------------------------------------------------------------------
// SFX observers
// ---------------------------------------------------------------------------

fn play(sfx: &AudioChannel<SfxChannel>, sound: Handle<AudioSource>) {
    sfx.play(sound);
}

fn on_weapon_swung(
    _trigger: On<WeaponSwung>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Option<Res<AudioAssets>>,
) {
    if let Some(assets) = assets {
        play(&sfx, assets.sword.clone());
    }
}

fn on_spell_fired(
    trigger: On<SpellFired>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Option<Res<AudioAssets>>,
) {
    let Some(assets) = assets else { return };
    let sound = match trigger.event().style {
        MagicKind::Heal => assets.heal.clone(),
        MagicKind::Flame => assets.flame.clone(),
    };
    play(&sfx, sound);
}

fn on_enemy_attacked(
    trigger: On<EnemyAttacked>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Option<Res<AudioAssets>>,
) {
    if let Some(assets) = assets {
        play(&sfx, attack_sound(&assets, trigger.event().monster));
    }
}

fn on_enemy_hit(
    _trigger: On<EnemyHit>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Option<Res<AudioAssets>>,
) {
    if let Some(assets) = assets {
        play(&sfx, assets.hit.clone());
    }
}

fn on_enemy_killed(
    _trigger: On<EnemyKilled>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Option<Res<AudioAssets>>,
) {
    if let Some(assets) = assets {
        play(&sfx, assets.death.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::PlayingState;
    use bevy::asset::AssetPlugin;
    use bevy::state::app::StatesPlugin;
    use bevy_kira_audio::AudioPlugin;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(AssetPlugin::default());
        app.add_plugins(StatesPlugin);
        app.add_plugins(AudioPlugin);
        app.init_state::<AppState>();
        app.add_sub_state::<PlayingState>();
        app.add_plugins(GameAudioPlugin);
        app
    }

    #[test]
    fn audio_plugin_initializes() {
        let mut app = setup_app();
        app.update();

        assert!(app.world().get_resource::<AudioChannel<MusicChannel>>().is_some());
        assert!(app.world().get_resource::<AudioChannel<SfxChannel>>().is_some());
    }

    #[test]
    fn missing_assets_are_silent() {
        let mut app = setup_app();
        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::InGame);
        app.update();
        app.world_mut().trigger(EnemyKilled {
            monster: MonsterKind::Slime,
        });
        app.world_mut().trigger(SpellFired {
            style: MagicKind::Heal,
        });
        app.update();
        assert_eq!(
            *app.world().resource::<State<AppState>>().get(),
            AppState::InGame
        );
    }
}

//! HUD overlay: health and energy bars, gold, keys and the selected spell.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::data::GameData;
use crate::plugins::player::Player;
use crate::plugins::telemetry::GameSet;

const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 18.0;
const BAR_BACKGROUND: Color = Color::srgb(0.13, 0.13, 0.13);
const HEALTH_COLOR: Color = Color::srgb(0.85, 0.15, 0.15);
const ENERGY_COLOR: Color = Color::srgb(0.2, 0.4, 0.9);

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_hud);
        app.add_systems(OnExit(AppState::InGame), despawn_hud);
        app.add_systems(
            Update,
            update_hud
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct HealthBar;

#[derive(Component)]
pub struct EnergyBar;

#[derive(Component)]
pub struct GoldText;

#[derive(Component)]
pub struct KeysText;

#[derive(Component)]
pub struct SpellText;

/// Filled share of a bar, in percent.
pub fn bar_percent(current: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    (current / max * 100.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn spawn_bar(parent: &mut ChildSpawnerCommands, marker: impl Component, color: Color) {
    parent
        .spawn((
            Node {
                width: Val::Px(BAR_WIDTH),
                height: Val::Px(BAR_HEIGHT),
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BackgroundColor(BAR_BACKGROUND),
        ))
        .with_children(|bar| {
            bar.spawn((
                marker,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    ..default()
                },
                BackgroundColor(color),
            ));
        });
}

fn text_line(marker: impl Component, initial: &str) -> impl Bundle {
    (
        marker,
        Text::new(initial),
        TextColor(Color::WHITE),
        TextFont {
            font_size: 20.0,
            ..default()
        },
    )
}

#[span_fn]
fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Auto,
                justify_content: JustifyContent::SpaceBetween,
                padding: UiRect::all(Val::Px(12.0)),
                position_type: PositionType::Absolute,
                top: Val::Px(0.0),
                left: Val::Px(0.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent
                .spawn(Node {
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(6.0),
                    ..default()
                })
                .with_children(|bars| {
                    spawn_bar(bars, HealthBar, HEALTH_COLOR);
                    spawn_bar(bars, EnergyBar, ENERGY_COLOR);
                });
            parent
                .spawn(Node {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::End,
                    row_gap: Val::Px(6.0),
                    ..default()
                })
                .with_children(|labels| {
                    labels.spawn(text_line(GoldText, "Gold: 0"));
                    labels.spawn(text_line(KeysText, "Keys: 0"));
                    labels.spawn(text_line(SpellText, "Spell: -"));
                });
        });
}

#[span_fn]
fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

#[allow(clippy::type_complexity)]
#[span_fn]
fn update_hud(
    data: Res<GameData>,
    players: Query<&Player>,
    mut health_bar: Query<&mut Node, (With<HealthBar>, Without<EnergyBar>)>,
    mut energy_bar: Query<&mut Node, (With<EnergyBar>, Without<HealthBar>)>,
    mut gold_text: Query<&mut Text, (With<GoldText>, Without<KeysText>, Without<SpellText>)>,
    mut keys_text: Query<&mut Text, (With<KeysText>, Without<GoldText>, Without<SpellText>)>,
    mut spell_text: Query<&mut Text, (With<SpellText>, Without<GoldText>, Without<KeysText>)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    if let Ok(mut node) = health_bar.single_mut() {
        node.width = Val::Percent(bar_percent(player.health, player.stats.health.value));
    }
    if let Ok(mut node) = energy_bar.single_mut() {
        node.width = Val::Percent(bar_percent(player.energy, player.stats.energy.value));
    }
    if let Ok(mut text) = gold_text.single_mut() {
        **text = format!("Gold: {}", player.gold);
    }
    if let Ok(mut text) = keys_text.single_mut() {
        **text = format!("Keys: {}", player.keys);
    }
    if let Ok(mut text) = spell_text.single_mut() {
        let name = data
            .spell(player.magic_index)
            .map(|s| s.kind.name())
            .unwrap_or("-");
        **text = format!("Spell: {name}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatSheet;
    use bevy::state::app::StatesPlugin;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.add_sub_state::<crate::app_state::PlayingState>();
        app.insert_resource(GameData::default());
        app.add_plugins(HudPlugin);
        app
    }

    fn transition_to(app: &mut App, state: AppState) {
        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(state);
        for _ in 0..5 {
            app.update();
        }
    }

    fn hud_count(app: &mut App) -> usize {
        app.world_mut()
            .query::<&HudRoot>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn bar_percent_is_clamped() {
        assert_eq!(bar_percent(50.0, 100.0), 50.0);
        assert_eq!(bar_percent(150.0, 100.0), 100.0);
        assert_eq!(bar_percent(-5.0, 100.0), 0.0);
        assert_eq!(bar_percent(5.0, 0.0), 0.0);
    }

    #[test]
    fn hud_lives_only_in_game() {
        let mut app = setup_app();
        transition_to(&mut app, AppState::InGame);
        assert_eq!(hud_count(&mut app), 1);
        transition_to(&mut app, AppState::Victory);
        assert_eq!(hud_count(&mut app), 0);
    }

    #[test]
    fn hud_tracks_the_player() {
        let mut app = setup_app();
        transition_to(&mut app, AppState::InGame);

        let mut player = Player::new(StatSheet::default());
        player.health = 25.0;
        player.gold = 310;
        player.keys = 2;
        player.magic_index = 1;
        app.world_mut().spawn(player);
        app.update();

        let gold = app
            .world_mut()
            .query_filtered::<&Text, With<GoldText>>()
            .single(app.world())
            .unwrap();
        assert_eq!(**gold, "Gold: 310");
        let keys = app
            .world_mut()
            .query_filtered::<&Text, With<KeysText>>()
            .single(app.world())
            .unwrap();
        assert_eq!(**keys, "Keys: 2");
        let spell = app
            .world_mut()
            .query_filtered::<&Text, With<SpellText>>()
            .single(app.world())
            .unwrap();
        assert_eq!(**spell, "Spell: heal");
        let bar = app
            .world_mut()
            .query_filtered::<&Node, With<HealthBar>>()
            .single(app.world())
            .unwrap();
        assert_eq!(bar.width, Val::Percent(25.0));
    }
}

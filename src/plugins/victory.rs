//! Victory screen: session totals, Enter to play again, Escape to quit.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::resources::GameStats;

pub struct VictoryPlugin;

impl Plugin for VictoryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::Victory), spawn_victory);
        app.add_systems(OnExit(AppState::Victory), despawn_victory);
        app.add_systems(Update, victory_input.run_if(in_state(AppState::Victory)));
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component)]
pub struct VictoryRoot;

/// Lines shown under the title.
pub fn summary_lines(stats: &GameStats) -> Vec<String> {
    vec![
        format!("Enemies slain: {}", stats.enemies_slain),
        format!("Keys collected: {}", stats.keys_collected),
        format!("Gold earned: {}", stats.gold_earned),
        format!("Deaths: {}", stats.deaths),
    ]
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn spawn_victory(mut commands: Commands, stats: Option<Res<GameStats>>) {
    let lines = summary_lines(&stats.as_deref().cloned().unwrap_or_default());
    info!("victory: {}", lines.join(", "));

    commands
        .spawn((
            VictoryRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::srgb(0.02, 0.05, 0.02)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("You escaped!"),
                TextColor(Color::srgb(1.0, 0.85, 0.0)),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
            ));

            for line in &lines {
                parent.spawn((
                    Text::new(line.clone()),
                    TextColor(Color::WHITE),
                    TextFont {
                        font_size: 20.0,
                        ..default()
                    },
                ));
            }

            parent.spawn((
                Text::new("Enter: play again    Escape: quit"),
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
            ));
        });
}

fn despawn_victory(mut commands: Commands, query: Query<Entity, With<VictoryRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

fn victory_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<AppState>>,
    mut exit: MessageWriter<AppExit>,
) {
    if keyboard.just_pressed(KeyCode::Enter) {
        next_state.set(AppState::InGame);
    } else if keyboard.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

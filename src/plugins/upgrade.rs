//! Upgrade menu: pauses play and lets the player spend gold on stats.
//!
//! `M` opens and closes the menu, `Escape` closes it. While open, Left/Right
//! move the selection and Space buys the selected stat. Every action starts a
//! short input cooldown so that a held key does not repeat every frame.

use std::time::Duration;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::{AppState, PlayingState};
use crate::plugins::player::Player;
use crate::plugins::telemetry::GameSet;
use crate::stats::{StatKind, StatSheet};

pub const MENU_INPUT_COOLDOWN: Duration = Duration::from_millis(300);

const PANEL_COLOR: Color = Color::srgba(0.05, 0.05, 0.08, 0.85);
const ITEM_COLOR: Color = Color::srgb(0.16, 0.16, 0.2);
const SELECTED_COLOR: Color = Color::srgb(0.45, 0.4, 0.2);
const CAPPED_TEXT_COLOR: Color = Color::srgb(0.5, 0.5, 0.5);

pub struct UpgradePlugin;

impl Plugin for UpgradePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UpgradeMenu>();
        app.add_systems(
            Update,
            toggle_upgrade_menu
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
        app.add_systems(
            Update,
            (upgrade_input, refresh_upgrade_panel.after(upgrade_input))
                .in_set(GameSet::Presentation)
                .run_if(in_state(PlayingState::Upgrading)),
        );
        app.add_systems(OnEnter(PlayingState::Upgrading), spawn_upgrade_panel);
        app.add_systems(OnExit(PlayingState::Upgrading), despawn_upgrade_panel);
    }
}

// ---------------------------------------------------------------------------
// Menu state
// ---------------------------------------------------------------------------

/// Keys the menu reacts to this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuInput {
    pub left: bool,
    pub right: bool,
    pub buy: bool,
}

impl MenuInput {
    pub fn from_keyboard(keyboard: &ButtonInput<KeyCode>) -> Self {
        Self {
            left: keyboard.pressed(KeyCode::ArrowLeft),
            right: keyboard.pressed(KeyCode::ArrowRight),
            buy: keyboard.pressed(KeyCode::Space),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct UpgradeMenu {
    /// Index into [`StatKind::ALL`].
    pub selected: usize,
    pub can_act: bool,
    pub action_time: Duration,
}

impl Default for UpgradeMenu {
    fn default() -> Self {
        Self {
            selected: 0,
            can_act: true,
            action_time: Duration::ZERO,
        }
    }
}

impl UpgradeMenu {
    pub fn selected_kind(&self) -> StatKind {
        StatKind::ALL[self.selected.min(StatKind::ALL.len() - 1)]
    }

    /// Apply one frame of input. Returns the stat bought, if a purchase went through.
    pub fn handle(
        &mut self,
        input: &MenuInput,
        now: Duration,
        stats: &mut StatSheet,
        gold: &mut u32,
    ) -> Option<StatKind> {
        self.cooldown(now);
        if !self.can_act {
            return None;
        }

        if input.right && self.selected + 1 < StatKind::ALL.len() {
            self.selected += 1;
            self.start_cooldown(now);
        } else if input.left && self.selected > 0 {
            self.selected -= 1;
            self.start_cooldown(now);
        }

        if input.buy {
            self.start_cooldown(now);
            let kind = self.selected_kind();
            if stats.purchase(kind, gold) {
                return Some(kind);
            }
        }
        None
    }

    fn start_cooldown(&mut self, now: Duration) {
        self.can_act = false;
        self.action_time = now;
    }

    fn cooldown(&mut self, now: Duration) {
        if !self.can_act && now.saturating_sub(self.action_time) >= MENU_INPUT_COOLDOWN {
            self.can_act = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component)]
pub struct UpgradePanel;

/// One column of the panel, showing the stat at this index.
#[derive(Component)]
pub struct UpgradeItem(pub usize);

#[derive(Component)]
pub struct UpgradeItemText(pub usize);

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn toggle_upgrade_menu(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    state: Option<Res<State<PlayingState>>>,
    mut next_state: ResMut<NextState<PlayingState>>,
) {
    let (Some(keyboard), Some(state)) = (keyboard, state) else {
        return;
    };
    match state.get() {
        PlayingState::Playing if keyboard.just_pressed(KeyCode::KeyM) => {
            info!("upgrade menu opened");
            next_state.set(PlayingState::Upgrading);
        }
        PlayingState::Upgrading
            if keyboard.just_pressed(KeyCode::KeyM) || keyboard.just_pressed(KeyCode::Escape) =>
        {
            info!("upgrade menu closed");
            next_state.set(PlayingState::Playing);
        }
        _ => {}
    }
}

fn upgrade_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    time: Res<Time>,
    mut menu: ResMut<UpgradeMenu>,
    mut players: Query<&mut Player>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    let Ok(mut player) = players.single_mut() else {
        return;
    };
    let input = MenuInput::from_keyboard(&keyboard);
    let player = &mut *player;
    if let Some(kind) = menu.handle(&input, time.elapsed(), &mut player.stats, &mut player.gold) {
        let line = player.stats.line(kind);
        info!(
            "upgraded {}: value={:.1} next_cost={:.0} gold={}",
            kind.name(),
            line.value,
            line.cost,
            player.gold
        );
    }
}

fn item_label(kind: StatKind, stats: &StatSheet) -> String {
    let line = stats.line(kind);
    format!(
        "{}\n{:.1} / {:.0}\n{:.0} gold",
        kind.name(),
        line.value,
        line.max,
        line.cost
    )
}

fn spawn_upgrade_panel(mut commands: Commands, players: Query<&Player>) {
    let stats = players
        .single()
        .map(|p| p.stats.clone())
        .unwrap_or_default();

    commands
        .spawn((
            UpgradePanel,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                column_gap: Val::Px(16.0),
                position_type: PositionType::Absolute,
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
        ))
        .with_children(|parent| {
            for (index, kind) in StatKind::ALL.iter().enumerate() {
                parent
                    .spawn((
                        UpgradeItem(index),
                        Node {
                            width: Val::Px(140.0),
                            height: Val::Px(220.0),
                            justify_content: JustifyContent::Center,
                            align_items: AlignItems::Center,
                            ..default()
                        },
                        BackgroundColor(ITEM_COLOR),
                    ))
                    .with_children(|item| {
                        item.spawn((
                            UpgradeItemText(index),
                            Text::new(item_label(*kind, &stats)),
                            TextColor(Color::WHITE),
                            TextFont {
                                font_size: 20.0,
                                ..default()
                            },
                        ));
                    });
            }
        });
}

fn refresh_upgrade_panel(
    menu: Res<UpgradeMenu>,
    players: Query<&Player>,
    mut items: Query<(&UpgradeItem, &mut BackgroundColor)>,
    mut texts: Query<(&UpgradeItemText, &mut Text, &mut TextColor)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    for (item, mut background) in &mut items {
        background.0 = if item.0 == menu.selected {
            SELECTED_COLOR
        } else {
            ITEM_COLOR
        };
    }
    for (label, mut text, mut color) in &mut texts {
        let kind = StatKind::ALL[label.0];
        **text = item_label(kind, &player.stats);
        color.0 = if player.stats.line(kind).can_purchase(player.gold) {
            Color::WHITE
        } else {
            CAPPED_TEXT_COLOR
        };
    }
}

fn despawn_upgrade_panel(mut commands: Commands, query: Query<Entity, With<UpgradePanel>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

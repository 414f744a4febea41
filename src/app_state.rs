use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
pub enum AppState {
    #[default]
    Loading,
    InGame,
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, SubStates)]
#[source(AppState = AppState::InGame)]
pub enum PlayingState {
    /// Spawning the level from its map layers.
    #[default]
    Building,
    Playing,
    /// Upgrade menu open; the world is frozen.
    Upgrading,
    /// Player died: tear the level down and build it again.
    Resetting,
}

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use super::level::LevelMap;
use super::player::Player;
use super::telemetry::GameSet;
use crate::geometry::{Hitbox, map_to_world};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera);
        app.add_systems(Update, follow_player.in_set(GameSet::Presentation));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Camera centre for a player at `target`, kept inside the map when the map
/// is larger than the view.
pub fn camera_focus(target: Vec2, view: Vec2, map: Vec2) -> Vec2 {
    let clamp_axis = |t: f32, view: f32, map: f32| {
        if map <= view {
            map / 2.0
        } else {
            t.clamp(view / 2.0, map - view / 2.0)
        }
    };
    Vec2::new(
        clamp_axis(target.x, view.x, map.x),
        clamp_axis(target.y, view.y, map.y),
    )
}

/// Keep the player centred on screen.
#[span_fn]
fn follow_player(
    map: Option<Res<LevelMap>>,
    windows: Query<&Window>,
    players: Query<&Hitbox, With<Player>>,
    mut cameras: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(hitbox) = players.single() else {
        return;
    };
    let Ok(mut transform) = cameras.single_mut() else {
        return;
    };

    let target = hitbox.center();
    let focus = match (map, windows.single()) {
        (Some(map), Ok(window)) => camera_focus(target, window.size(), map.pixel_size()),
        _ => target,
    };
    let z = transform.translation.z;
    transform.translation = map_to_world(focus, 0.0).with_z(z);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_follows_in_the_middle_of_a_large_map() {
        let focus = camera_focus(
            Vec2::new(1000.0, 800.0),
            Vec2::new(640.0, 480.0),
            Vec2::new(3000.0, 2000.0),
        );
        assert_eq!(focus, Vec2::new(1000.0, 800.0));
    }

    #[test]
    fn focus_stops_at_map_edges() {
        let focus = camera_focus(
            Vec2::new(10.0, 1990.0),
            Vec2::new(640.0, 480.0),
            Vec2::new(3000.0, 2000.0),
        );
        assert_eq!(focus, Vec2::new(320.0, 1760.0));
    }

    #[test]
    fn small_map_is_centred() {
        let focus = camera_focus(
            Vec2::new(10.0, 10.0),
            Vec2::new(1280.0, 720.0),
            Vec2::new(640.0, 640.0),
        );
        assert_eq!(focus, Vec2::new(320.0, 320.0));
    }

    #[test]
    fn camera_moves_with_player() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, follow_player);
        let camera = app.world_mut().spawn((Camera2d, Transform::default())).id();
        app.world_mut().spawn((
            Player::new(crate::stats::StatSheet::default()),
            Hitbox::new(100.0, 200.0, 20.0, 20.0),
        ));
        app.update();

        let t = app.world().entity(camera).get::<Transform>().unwrap();
        assert_eq!(t.translation.x, 110.0);
        assert_eq!(t.translation.y, -210.0);
    }
}

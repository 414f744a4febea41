pub mod audio;
pub mod camera;
pub mod combat;
pub mod enemies;
pub mod hud;
pub mod level;
pub mod movement;
pub mod particles;
pub mod player;
pub mod sprites;
pub mod telemetry;
pub mod upgrade;
pub mod victory;

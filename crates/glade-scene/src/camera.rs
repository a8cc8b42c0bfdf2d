//! First-person camera controls

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use glade_core::config::CameraConfig;

/// Pitch limit just short of straight up/down
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// First-person camera state. Orientation lives in yaw/pitch so mouse
/// look never accumulates roll.
#[derive(Component, Debug, Clone)]
pub struct FlyCamera {
    pub yaw: f32,
    pub pitch: f32,
    /// Movement per frame at 60 Hz
    pub speed: f32,
    /// Pixels of mouse motion per radian
    pub angular_sensibility: f32,
}

impl FlyCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            speed: config.speed,
            angular_sensibility: config.angular_sensibility.max(1.0),
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Point the camera along `direction`
    pub fn face(&mut self, direction: Vec3) {
        let Some(dir) = direction.try_normalize() else {
            return;
        };
        self.yaw = (-dir.x).atan2(-dir.z);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Apply a mouse/touch delta in pixels
    pub fn rotate_by(&mut self, delta: Vec2) {
        self.yaw -= delta.x / self.angular_sensibility;
        self.pitch = (self.pitch - delta.y / self.angular_sensibility).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

/// Move the camera to `position` and aim it at `target`
pub fn place_camera(transform: &mut Transform, fly: &mut FlyCamera, position: Vec3, target: Vec3) {
    transform.translation = position;
    fly.face(target - position);
    transform.rotation = fly.rotation();
}

/// Spawn the main camera at the configured start position, facing +Z
pub fn spawn_camera(commands: &mut Commands, config: &CameraConfig) -> Entity {
    let start = Vec3::from(config.start);
    let mut fly = FlyCamera::from_config(config);
    fly.face(Vec3::Z);

    commands
        .spawn((
            Camera3d::default(),
            Projection::Perspective(PerspectiveProjection {
                near: config.near,
                far: 1000.0,
                ..default()
            }),
            Transform::from_translation(start).with_rotation(fly.rotation()),
            fly,
            MainCamera,
            Name::new("camera"),
        ))
        .id()
}

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (fly_camera_look, fly_camera_move).chain());
    }
}

fn fly_camera_look(
    mut cameras: Query<(&mut Transform, &mut FlyCamera), With<MainCamera>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
) {
    let mut total_motion = Vec2::ZERO;
    for motion in mouse_motion.read() {
        total_motion += motion.delta;
    }

    let mut delta = Vec2::ZERO;
    if mouse_button.pressed(MouseButton::Left) {
        delta += total_motion;
    }

    // Single-finger drag looks around on touch screens
    if touch_input.iter().count() == 1 {
        for touch in touch_input.iter() {
            delta += touch.delta();
        }
    }

    if delta == Vec2::ZERO {
        return;
    }

    for (mut transform, mut fly) in cameras.iter_mut() {
        fly.rotate_by(delta);
        transform.rotation = fly.rotation();
    }
}

fn fly_camera_move(
    mut cameras: Query<(&mut Transform, &FlyCamera), With<MainCamera>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let mut input = Vec3::ZERO;
    if keyboard.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        input.z -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        input.z += 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        input.x -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        input.x += 1.0;
    }

    if input == Vec3::ZERO {
        return;
    }

    // Speed is specified per frame at 60 Hz
    let frames = time.delta_secs() * 60.0;
    for (mut transform, fly) in cameras.iter_mut() {
        let step = fly.rotation() * input.normalize() * fly.speed * frames;
        transform.translation += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fly() -> FlyCamera {
        FlyCamera::from_config(&CameraConfig::default())
    }

    #[test]
    fn test_face_matches_forward() {
        let mut cam = fly();
        for dir in [Vec3::Z, Vec3::NEG_Z, Vec3::X, Vec3::new(1.0, -1.0, 2.0)] {
            cam.face(dir);
            let forward = cam.rotation() * Vec3::NEG_Z;
            assert!(forward.distance(dir.normalize()) < 1e-5, "dir {:?} -> {:?}", dir, forward);
        }
    }

    #[test]
    fn test_face_zero_is_ignored() {
        let mut cam = fly();
        cam.face(Vec3::X);
        let yaw = cam.yaw;
        cam.face(Vec3::ZERO);
        assert_eq!(cam.yaw, yaw);
    }

    #[test]
    fn test_rotate_by_uses_angular_sensibility() {
        let mut cam = fly();
        cam.rotate_by(Vec2::new(2000.0, 0.0));
        assert!((cam.yaw + 1.0).abs() < 1e-6);

        cam.rotate_by(Vec2::new(0.0, 1e6));
        assert!((cam.pitch + MAX_PITCH).abs() < 1e-6);
    }

    #[test]
    fn test_place_camera_looks_at_target() {
        let mut cam = fly();
        let mut transform = Transform::default();
        place_camera(&mut transform, &mut cam, Vec3::new(1.0, 1.0, -4.0), Vec3::ONE);
        assert_eq!(transform.translation, Vec3::new(1.0, 1.0, -4.0));
        let forward = transform.rotation * Vec3::NEG_Z;
        assert!(forward.distance(Vec3::Z) < 1e-5);
    }
}

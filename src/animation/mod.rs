//! 动画：姿态插值与关键帧播放

mod easing;
mod interpolation;
mod pose_track;

pub use easing::{CubicBezier, Curve, Easing};
pub use interpolation::{interpolate_poses, lerp_angle, lerp_f32, FieldKind, PoseField};
pub use pose_track::{Playhead, PoseKeyframe, PoseTrack};

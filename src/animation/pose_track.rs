//! 姿态关键帧轨道
//!
//! 存储一条时间轴上的全部关键帧，按帧号查找前后关键帧并插值。
//! 关键帧上的缓动作用于“到达该关键帧”的那一段。

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::easing::Easing;
use super::interpolation::interpolate_poses;
use crate::skeleton::Pose;
use crate::{PoseError, Result};

/// 姿态关键帧
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseKeyframe {
    pub frame_index: u32,
    pub pose: Pose,
    /// 前一关键帧 → 本关键帧的缓动
    pub easing: Easing,
}

impl PoseKeyframe {
    pub fn new(frame_index: u32, pose: Pose) -> Self {
        Self {
            frame_index,
            pose,
            easing: Easing::Linear,
        }
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// 插值系数
#[inline]
fn coefficient(prev_frame: u32, next_frame: u32, frame: f32) -> f32 {
    let interval = next_frame.saturating_sub(prev_frame);
    if interval == 0 {
        return 1.0;
    }
    ((frame - prev_frame as f32) / interval as f32).clamp(0.0, 1.0)
}

/// 姿态轨道
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseTrack {
    /// 帧号 -> 关键帧
    pub keyframes: BTreeMap<u32, PoseKeyframe>,
}

impl PoseTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入关键帧，返回同帧号的旧关键帧
    pub fn insert_keyframe(&mut self, keyframe: PoseKeyframe) -> Option<PoseKeyframe> {
        self.keyframes.insert(keyframe.frame_index, keyframe)
    }

    pub fn remove_keyframe(&mut self, frame_index: u32) -> Option<PoseKeyframe> {
        self.keyframes.remove(&frame_index)
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn max_frame_index(&self) -> u32 {
        self.keyframes.keys().next_back().copied().unwrap_or(0)
    }

    /// 查找 `frame` 之前（含）与之后的关键帧
    fn search_closest(&self, frame: f32) -> (Option<&PoseKeyframe>, Option<&PoseKeyframe>) {
        let floor = frame.max(0.0).floor() as u32;
        let prev = self
            .keyframes
            .range((Unbounded, Included(floor)))
            .next_back()
            .map(|(_, kf)| kf);
        let next = self
            .keyframes
            .range((Excluded(floor), Unbounded))
            .next()
            .map(|(_, kf)| kf);
        (prev, next)
    }

    /// 在任意（小数）帧求值
    ///
    /// 第一帧之前保持第一帧，最后一帧之后保持最后一帧。
    pub fn seek(&self, frame: f32) -> Result<Pose> {
        match self.search_closest(frame) {
            (Some(prev), Some(next)) => {
                let coef = coefficient(prev.frame_index, next.frame_index, frame);
                let t = next.easing.apply(coef);
                Ok(interpolate_poses(&prev.pose, &next.pose, t))
            }
            (Some(only), None) | (None, Some(only)) => Ok(only.pose),
            (None, None) => Err(PoseError::EmptyTrack),
        }
    }
}

/// 播放头
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    /// 当前帧（小数）
    pub frame: f32,
    /// 每秒帧数
    pub fps: f32,
    /// 到末尾后是否回到开头
    pub looping: bool,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            frame: 0.0,
            fps: 24.0,
            looping: true,
        }
    }
}

impl Playhead {
    /// 前进 `dt` 秒，返回新的帧位置
    pub fn advance(&mut self, dt: f32, last_frame: u32) -> f32 {
        let end = last_frame as f32;
        self.frame += dt.max(0.0) * self.fps;
        if self.frame > end {
            self.frame = if self.looping && end > 0.0 {
                self.frame.rem_euclid(end)
            } else {
                end
            };
        }
        self.frame
    }

    /// 非循环播放是否已到末尾
    pub fn finished(&self, last_frame: u32) -> bool {
        !self.looping && self.frame >= last_frame as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::JointId;
    use glam::Vec2;

    fn track() -> PoseTrack {
        let mut track = PoseTrack::new();
        track.insert_keyframe(PoseKeyframe::new(0, Pose::t_pose()));
        track.insert_keyframe(PoseKeyframe::new(
            10,
            Pose::t_pose()
                .with_offset(Vec2::new(100.0, 0.0))
                .with_angle(JointId::LeftElbow, 1.0),
        ));
        track
    }

    #[test]
    fn test_seek_midpoint() {
        let pose = track().seek(5.0).unwrap();
        assert!((pose.offset.x - 50.0).abs() < 1e-4);
        assert!((pose.angle(JointId::LeftElbow) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_seek_exact_and_outside() {
        let t = track();
        assert_eq!(t.seek(0.0).unwrap(), Pose::t_pose());
        assert_eq!(t.seek(10.0).unwrap().offset, Vec2::new(100.0, 0.0));
        assert_eq!(t.seek(25.0).unwrap().offset, Vec2::new(100.0, 0.0));
        assert_eq!(t.max_frame_index(), 10);
    }

    #[test]
    fn test_easing_applies_to_arriving_segment() {
        let mut t = track();
        let last = t.remove_keyframe(10).unwrap();
        t.insert_keyframe(last.with_easing(Easing::Smooth));
        let pose = t.seek(2.0).unwrap();
        // smoothstep(0.2) = 0.104
        assert!((pose.offset.x - 10.4).abs() < 1e-3);
    }

    #[test]
    fn test_empty_track() {
        assert!(matches!(PoseTrack::new().seek(1.0), Err(PoseError::EmptyTrack)));
    }

    #[test]
    fn test_playhead_loops() {
        let mut head = Playhead { frame: 0.0, fps: 10.0, looping: true };
        assert!((head.advance(0.5, 10) - 5.0).abs() < 1e-5);
        assert!((head.advance(0.7, 10) - 2.0).abs() < 1e-4);

        let mut once = Playhead { looping: false, ..head };
        once.advance(5.0, 10);
        assert_eq!(once.frame, 10.0);
        assert!(once.finished(10));
    }
}

//! 骨骼系统
//!
//! - joint: 静态关节树、骨长、静止角
//! - pose: 类型化 Pose（根偏移 + 每关节局部角）
//! - forward: 正向运动学 Pose → Skeleton
//! - ik_solver: 两段解析 IK
//! - chain_solver: 多段迭代 IK

mod chain_solver;
mod forward;
mod ik_solver;
mod joint;
mod pose;

pub use chain_solver::{solve_chain, ChainIk};
pub use forward::{
    compute_skeleton, compute_skeleton_on, world_angles, BoneSegment, SegmentKind, Skeleton,
};
pub use ik_solver::{reach_limb, solve_two_bone, TwoBoneSolution};
pub use joint::{
    extremity_segment, limb_lengths, JointDef, JointFlags, JointId, Limb, Side, HIERARCHY,
    ARM_LENGTH, FOOT_LENGTH, FOREARM_LENGTH, HAND_LENGTH, HIP_LENGTH, NECK_LENGTH,
    SHIN_LENGTH, SHOULDER_LENGTH, THIGH_LENGTH, TRUNK_LENGTH, WAIST_LENGTH,
};
pub use pose::Pose;

use std::f32::consts::{PI, TAU};

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Point;

// ============================================================================
// 舞台
// ============================================================================

/// 舞台矩形（原点在左上角，y 向下）
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stage {
    pub width: f32,
    pub height: f32,
}

impl Stage {
    pub const DEFAULT: Stage = Stage { width: 800.0, height: 600.0 };

    #[inline]
    pub fn center(&self) -> Point {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// 角度工具
// ============================================================================

/// 角度归一化到 (-π, π]
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let r = (angle + PI).rem_euclid(TAU) - PI;
    if r <= -PI {
        r + TAU
    } else {
        r
    }
}

/// 从 `from` 到 `to` 的最短有符号角差，落在 (-π, π]
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// 把刚算出的角度对齐到上一帧的角度轨迹上
///
/// 结果与 `raw` 相差整圈，与 `previous` 相差不超过半圈。
#[inline]
pub fn reconcile_angle(raw: f32, previous: f32) -> f32 {
    previous + shortest_delta(previous, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle_range() {
        for i in -40..=40 {
            let a = i as f32 * 0.37;
            let w = wrap_angle(a);
            assert!(w > -PI - 1e-6 && w <= PI + 1e-6, "{a} -> {w}");
            assert!(((a - w) / TAU - ((a - w) / TAU).round()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_shortest_delta_crosses_pi() {
        let d = shortest_delta(3.0, -3.0);
        assert!((d - (TAU - 6.0)).abs() < 1e-5);
    }

    #[test]
    fn test_reconcile_keeps_track() {
        // 上一帧已转过 1.9 圈，新测得的原始角在 (-π, π] 内
        let previous = 1.9 * TAU;
        let raw = wrap_angle(previous + 0.1);
        let r = reconcile_angle(raw, previous);
        assert!((r - (previous + 0.1)).abs() < 1e-4);
    }

    #[test]
    fn test_stage_center() {
        assert_eq!(Stage::DEFAULT.center(), Vec2::new(400.0, 300.0));
    }
}

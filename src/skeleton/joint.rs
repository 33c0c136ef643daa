//! 关节层级与静止姿态
//!
//! 固定的 16 关节树：
//! - Root → Torso → Head / 左右 Shoulder → Elbow → Hand
//! - Root → Waist → 左右 Hip → Knee → Foot
//!
//! 每个关节携带：父关节、到父关节的骨长、静止角（BaseAngle）、绘制宽度、角色标志。
//! 全零局部角 = T-pose。坐标系 y 轴向下，角度从 +x 起顺时针为正。

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::PoseError;

// ============================================================================
// 骨长常量
// ============================================================================

/// 躯干（Root → Torso）
pub const TRUNK_LENGTH: f32 = 60.0;
/// 腰（Root → Waist）
pub const WAIST_LENGTH: f32 = 15.0;
/// 颈（Torso → Head）
pub const NECK_LENGTH: f32 = 30.0;
/// 肩宽的一半（Torso → Shoulder）
pub const SHOULDER_LENGTH: f32 = 20.0;
/// 上臂
pub const ARM_LENGTH: f32 = 45.0;
/// 前臂
pub const FOREARM_LENGTH: f32 = 40.0;
/// 手（末端段）
pub const HAND_LENGTH: f32 = 12.0;
/// 胯宽的一半（Waist → Hip）
pub const HIP_LENGTH: f32 = 12.0;
/// 大腿
pub const THIGH_LENGTH: f32 = 55.0;
/// 小腿
pub const SHIN_LENGTH: f32 = 50.0;
/// 脚（末端段）
pub const FOOT_LENGTH: f32 = 15.0;

// ============================================================================
// 关节标识
// ============================================================================

/// 关节标识
///
/// 声明顺序即拓扑顺序（父在子前），正向运动学与物理提取都按此顺序一次遍历。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum JointId {
    Root = 0,
    Torso,
    Head,
    LeftShoulder,
    LeftElbow,
    LeftHand,
    RightShoulder,
    RightElbow,
    RightHand,
    Waist,
    LeftHip,
    LeftKnee,
    LeftFoot,
    RightHip,
    RightKnee,
    RightFoot,
}

/// 左右
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Left,
    Right,
}

/// 肢体类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Limb {
    Arm,
    Leg,
}

impl JointId {
    pub const COUNT: usize = 16;

    /// 全部关节（拓扑顺序）
    pub const ALL: [JointId; Self::COUNT] = [
        JointId::Root,
        JointId::Torso,
        JointId::Head,
        JointId::LeftShoulder,
        JointId::LeftElbow,
        JointId::LeftHand,
        JointId::RightShoulder,
        JointId::RightElbow,
        JointId::RightHand,
        JointId::Waist,
        JointId::LeftHip,
        JointId::LeftKnee,
        JointId::LeftFoot,
        JointId::RightHip,
        JointId::RightKnee,
        JointId::RightFoot,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn def(self) -> &'static JointDef {
        &HIERARCHY[self.index()]
    }

    #[inline]
    pub fn parent(self) -> Option<JointId> {
        self.def().parent
    }

    #[inline]
    pub fn base_angle(self) -> f32 {
        self.def().base_angle
    }

    /// 到父关节的骨长（Root 为 0）
    #[inline]
    pub fn length(self) -> f32 {
        self.def().length
    }

    #[inline]
    pub fn flags(self) -> JointFlags {
        self.def().flags
    }

    /// 有序子关节
    pub fn children(self) -> &'static [JointId] {
        use JointId::*;
        match self {
            Root => &[Torso, Waist],
            Torso => &[Head, LeftShoulder, RightShoulder],
            LeftShoulder => &[LeftElbow],
            LeftElbow => &[LeftHand],
            RightShoulder => &[RightElbow],
            RightElbow => &[RightHand],
            Waist => &[LeftHip, RightHip],
            LeftHip => &[LeftKnee],
            LeftKnee => &[LeftFoot],
            RightHip => &[RightKnee],
            RightKnee => &[RightFoot],
            Head | LeftHand | RightHand | LeftFoot | RightFoot => &[],
        }
    }

    /// 肢体三关节：锚点、中间关节、末端
    pub fn limb(side: Side, limb: Limb) -> [JointId; 3] {
        use JointId::*;
        match (side, limb) {
            (Side::Left, Limb::Arm) => [LeftShoulder, LeftElbow, LeftHand],
            (Side::Right, Limb::Arm) => [RightShoulder, RightElbow, RightHand],
            (Side::Left, Limb::Leg) => [LeftHip, LeftKnee, LeftFoot],
            (Side::Right, Limb::Leg) => [RightHip, RightKnee, RightFoot],
        }
    }

    pub fn side(self) -> Option<Side> {
        use JointId::*;
        match self {
            LeftShoulder | LeftElbow | LeftHand | LeftHip | LeftKnee | LeftFoot => Some(Side::Left),
            RightShoulder | RightElbow | RightHand | RightHip | RightKnee | RightFoot => {
                Some(Side::Right)
            }
            Root | Torso | Head | Waist => None,
        }
    }

    pub fn name(self) -> &'static str {
        use JointId::*;
        match self {
            Root => "root",
            Torso => "torso",
            Head => "head",
            LeftShoulder => "left_shoulder",
            LeftElbow => "left_elbow",
            LeftHand => "left_hand",
            RightShoulder => "right_shoulder",
            RightElbow => "right_elbow",
            RightHand => "right_hand",
            Waist => "waist",
            LeftHip => "left_hip",
            LeftKnee => "left_knee",
            LeftFoot => "left_foot",
            RightHip => "right_hip",
            RightKnee => "right_knee",
            RightFoot => "right_foot",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointId {
    type Err = PoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointId::ALL
            .iter()
            .copied()
            .find(|j| j.name() == s)
            .ok_or_else(|| PoseError::UnknownJoint(s.to_string()))
    }
}

// ============================================================================
// 关节标志
// ============================================================================

bitflags! {
    /// 关节角色
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct JointFlags: u8 {
        /// 主质量（根、躯干、胯、肩）
        const PRIMARY = 1 << 0;
        /// 枢纽（腰、头）
        const PIVOT = 1 << 1;
        /// 肢体末端（手、脚），额外绘制一段末端骨
        const EXTREMITY = 1 << 2;
    }
}

// ============================================================================
// 层级表
// ============================================================================

/// 关节静态定义
#[derive(Clone, Copy, Debug)]
pub struct JointDef {
    pub id: JointId,
    pub parent: Option<JointId>,
    /// 到父关节的骨长
    pub length: f32,
    /// 静止角
    pub base_angle: f32,
    /// 父关节 → 本关节这段骨的绘制宽度
    pub width: f32,
    pub flags: JointFlags,
}

const fn def(
    id: JointId,
    parent: Option<JointId>,
    length: f32,
    base_angle: f32,
    width: f32,
    flags: JointFlags,
) -> JointDef {
    JointDef { id, parent, length, base_angle, width, flags }
}

const NONE: JointFlags = JointFlags::empty();

/// 层级表，按 `JointId` 下标排列
pub static HIERARCHY: [JointDef; JointId::COUNT] = {
    use JointId::*;
    [
        def(Root, None, 0.0, 0.0, 0.0, JointFlags::PRIMARY),
        def(Torso, Some(Root), TRUNK_LENGTH, -FRAC_PI_2, 14.0, JointFlags::PRIMARY),
        def(Head, Some(Torso), NECK_LENGTH, 0.0, 8.0, JointFlags::PIVOT),
        def(LeftShoulder, Some(Torso), SHOULDER_LENGTH, -FRAC_PI_2, 10.0, JointFlags::PRIMARY),
        def(LeftElbow, Some(LeftShoulder), ARM_LENGTH, 0.0, 9.0, NONE),
        def(LeftHand, Some(LeftElbow), FOREARM_LENGTH, 0.0, 7.0, JointFlags::EXTREMITY),
        def(RightShoulder, Some(Torso), SHOULDER_LENGTH, FRAC_PI_2, 10.0, JointFlags::PRIMARY),
        def(RightElbow, Some(RightShoulder), ARM_LENGTH, 0.0, 9.0, NONE),
        def(RightHand, Some(RightElbow), FOREARM_LENGTH, 0.0, 7.0, JointFlags::EXTREMITY),
        def(Waist, Some(Root), WAIST_LENGTH, FRAC_PI_2, 12.0, JointFlags::PIVOT),
        def(LeftHip, Some(Waist), HIP_LENGTH, FRAC_PI_2, 10.0, JointFlags::PRIMARY),
        def(LeftKnee, Some(LeftHip), THIGH_LENGTH, -FRAC_PI_2, 11.0, NONE),
        def(LeftFoot, Some(LeftKnee), SHIN_LENGTH, 0.0, 9.0, JointFlags::EXTREMITY),
        def(RightHip, Some(Waist), HIP_LENGTH, -FRAC_PI_2, 10.0, JointFlags::PRIMARY),
        def(RightKnee, Some(RightHip), THIGH_LENGTH, FRAC_PI_2, 11.0, NONE),
        def(RightFoot, Some(RightKnee), SHIN_LENGTH, 0.0, 9.0, JointFlags::EXTREMITY),
    ]
};

/// 末端段（手掌、脚掌）的长度和宽度
pub fn extremity_segment(joint: JointId) -> Option<(f32, f32)> {
    match joint {
        JointId::LeftHand | JointId::RightHand => Some((HAND_LENGTH, 5.0)),
        JointId::LeftFoot | JointId::RightFoot => Some((FOOT_LENGTH, 6.0)),
        _ => None,
    }
}

/// 单肢两段骨长（上段、下段）
pub fn limb_lengths(limb: Limb) -> (f32, f32) {
    match limb {
        Limb::Arm => (ARM_LENGTH, FOREARM_LENGTH),
        Limb::Leg => (THIGH_LENGTH, SHIN_LENGTH),
    }
}

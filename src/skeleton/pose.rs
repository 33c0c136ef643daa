//! 类型化姿态
//!
//! Pose 是引擎唯一的交换结构：根偏移 + 每个关节一个局部角（弧度）。
//! 它是 Copy 值类型，编辑操作通过 `with_*` 构造新值，不原地修改已提交的姿态。

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::joint::{JointId, Limb, Side};
use crate::Point;

/// 姿态
///
/// Root 的角度槽恒为 0（根的世界角固定为 0），其余 15 个关节各有一个局部角。
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// 根相对舞台中心的偏移
    pub offset: Point,
    angles: [f32; JointId::COUNT],
}

impl Default for Pose {
    fn default() -> Self {
        Self::t_pose()
    }
}

impl Pose {
    /// 全零局部角（T-pose）
    pub const fn t_pose() -> Self {
        Self {
            offset: Vec2::ZERO,
            angles: [0.0; JointId::COUNT],
        }
    }

    /// 从按 `JointId` 下标排列的角度数组构造，Root 槽被忽略
    pub fn from_angles(offset: Point, mut angles: [f32; JointId::COUNT]) -> Self {
        angles[JointId::Root.index()] = 0.0;
        Self { offset, angles }
    }

    #[inline]
    pub fn angle(&self, joint: JointId) -> f32 {
        self.angles[joint.index()]
    }

    #[inline]
    pub fn angles(&self) -> &[f32; JointId::COUNT] {
        &self.angles
    }

    /// 替换单个关节的局部角
    #[must_use]
    pub fn with_angle(mut self, joint: JointId, angle: f32) -> Self {
        if joint != JointId::Root {
            self.angles[joint.index()] = angle;
        }
        self
    }

    /// 在现有局部角上叠加
    #[must_use]
    pub fn with_angle_delta(self, joint: JointId, delta: f32) -> Self {
        let current = self.angle(joint);
        self.with_angle(joint, current + delta)
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    /// 批量替换
    #[must_use]
    pub fn with_angles<I>(self, angles: I) -> Self
    where
        I: IntoIterator<Item = (JointId, f32)>,
    {
        angles
            .into_iter()
            .fold(self, |pose, (joint, angle)| pose.with_angle(joint, angle))
    }

    /// 单肢三个关节的局部角（锚点、中间、末端）
    pub fn limb(&self, side: Side, limb: Limb) -> [f32; 3] {
        JointId::limb(side, limb).map(|j| self.angle(j))
    }

    /// 中轴关节（躯干、腰、头）的局部角
    pub fn central(&self) -> [f32; 3] {
        [
            self.angle(JointId::Torso),
            self.angle(JointId::Waist),
            self.angle(JointId::Head),
        ]
    }

    /// 左右镜像：交换两侧同名关节并翻转所有局部角的旋向
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let mut angles = [0.0; JointId::COUNT];
        for joint in JointId::ALL {
            angles[mirror_joint(joint).index()] = -self.angle(joint);
        }
        Self::from_angles(Vec2::new(-self.offset.x, self.offset.y), angles)
    }
}

fn mirror_joint(joint: JointId) -> JointId {
    use JointId::*;
    match joint {
        LeftShoulder => RightShoulder,
        LeftElbow => RightElbow,
        LeftHand => RightHand,
        LeftHip => RightHip,
        LeftKnee => RightKnee,
        LeftFoot => RightFoot,
        RightShoulder => LeftShoulder,
        RightElbow => LeftElbow,
        RightHand => LeftHand,
        RightHip => LeftHip,
        RightKnee => LeftKnee,
        RightFoot => LeftFoot,
        Root | Torso | Head | Waist => joint,
    }
}

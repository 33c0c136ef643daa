//! 正向运动学
//!
//! 从根出发沿层级一次遍历：
//! world(j) = world(parent) + base(j) + local(j)，world(root) = 0
//! pos(j)   = pos(parent) + length(j) · (cos, sin)(world(j))
//!
//! 纯函数，无缓存；相同输入得到逐位相同的输出。

use glam::Vec2;

use super::joint::{extremity_segment, JointId, HIERARCHY};
use super::pose::Pose;
use super::Stage;
use crate::Point;

/// 骨段类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    /// 父关节 → 本关节
    Bone,
    /// 手掌、脚掌：从末端关节沿其世界角延伸
    Extremity,
}

/// 世界空间骨段
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneSegment {
    pub joint: JointId,
    pub kind: SegmentKind,
    pub start: Point,
    pub end: Point,
    /// 绘制宽度
    pub width: f32,
    /// 世界角
    pub angle: f32,
}

/// 世界空间骨架快照
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    positions: [Point; JointId::COUNT],
    world_angles: [f32; JointId::COUNT],
    /// 按层级顺序排列的骨段
    pub segments: Vec<BoneSegment>,
}

impl Skeleton {
    #[inline]
    pub fn position(&self, joint: JointId) -> Point {
        self.positions[joint.index()]
    }

    #[inline]
    pub fn world_angle(&self, joint: JointId) -> f32 {
        self.world_angles[joint.index()]
    }

    #[inline]
    pub fn positions(&self) -> &[Point; JointId::COUNT] {
        &self.positions
    }

    /// (关节, 位置) 迭代
    pub fn joints(&self) -> impl Iterator<Item = (JointId, Point)> + '_ {
        JointId::ALL.iter().map(move |&j| (j, self.positions[j.index()]))
    }
}

/// 在默认舞台上计算骨架
pub fn compute_skeleton(pose: &Pose) -> Skeleton {
    compute_skeleton_on(pose, &Stage::DEFAULT)
}

/// 在指定舞台上计算骨架
pub fn compute_skeleton_on(pose: &Pose, stage: &Stage) -> Skeleton {
    let world_angles = world_angles(pose);
    let mut positions = [Vec2::ZERO; JointId::COUNT];
    let mut segments = Vec::with_capacity(JointId::COUNT + 3);

    for def in HIERARCHY.iter() {
        let i = def.id.index();
        let Some(parent) = def.parent else {
            positions[i] = stage.center() + pose.offset;
            continue;
        };

        let angle = world_angles[i];
        let dir = Vec2::new(angle.cos(), angle.sin());
        let start = positions[parent.index()];
        let end = start + dir * def.length;
        positions[i] = end;

        segments.push(BoneSegment {
            joint: def.id,
            kind: SegmentKind::Bone,
            start,
            end,
            width: def.width,
            angle,
        });

        if let Some((length, width)) = extremity_segment(def.id) {
            segments.push(BoneSegment {
                joint: def.id,
                kind: SegmentKind::Extremity,
                start: end,
                end: end + dir * length,
                width,
                angle,
            });
        }
    }

    Skeleton {
        positions,
        world_angles,
        segments,
    }
}

/// 每个关节的世界角
pub fn world_angles(pose: &Pose) -> [f32; JointId::COUNT] {
    let mut world = [0.0; JointId::COUNT];
    for def in HIERARCHY.iter() {
        if let Some(parent) = def.parent {
            world[def.id.index()] = world[parent.index()] + def.base_angle + pose.angle(def.id);
        }
    }
    world
}

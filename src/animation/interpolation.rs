//! 姿态插值
//!
//! 每个标量字段按静态的字段类型表分派：
//! - 根偏移 x/y：线性插值
//! - 关节局部角：最短弧插值，差值先归一化到 (-π, π]

use glam::Vec2;

use crate::skeleton::{shortest_delta, JointId, Pose};

/// 插值方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Linear,
    Angular,
}

/// Pose 的标量字段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseField {
    OffsetX,
    OffsetY,
    Angle(JointId),
}

impl PoseField {
    /// 字段类型表
    #[inline]
    pub fn kind(self) -> FieldKind {
        match self {
            PoseField::OffsetX | PoseField::OffsetY => FieldKind::Linear,
            PoseField::Angle(_) => FieldKind::Angular,
        }
    }

    /// 全部字段：偏移在前，关节角按层级顺序（Root 无自由角，不含在内）
    pub fn all() -> impl Iterator<Item = PoseField> {
        [PoseField::OffsetX, PoseField::OffsetY].into_iter().chain(
            JointId::ALL
                .into_iter()
                .filter(|&j| j != JointId::Root)
                .map(PoseField::Angle),
        )
    }
}

impl Pose {
    #[inline]
    pub fn field(&self, field: PoseField) -> f32 {
        match field {
            PoseField::OffsetX => self.offset.x,
            PoseField::OffsetY => self.offset.y,
            PoseField::Angle(joint) => self.angle(joint),
        }
    }

    #[must_use]
    pub fn with_field(self, field: PoseField, value: f32) -> Pose {
        match field {
            PoseField::OffsetX => self.with_offset(Vec2::new(value, self.offset.y)),
            PoseField::OffsetY => self.with_offset(Vec2::new(self.offset.x, value)),
            PoseField::Angle(joint) => self.with_angle(joint, value),
        }
    }
}

#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 最短弧角度插值
#[inline]
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    a + shortest_delta(a, b) * t
}

#[inline]
fn lerp_field(kind: FieldKind, a: f32, b: f32, t: f32) -> f32 {
    match kind {
        FieldKind::Linear => lerp_f32(a, b, t),
        FieldKind::Angular => lerp_angle(a, b, t),
    }
}

/// 两个姿态之间插值，`t` 截断到 [0, 1]
pub fn interpolate_poses(a: &Pose, b: &Pose, t: f32) -> Pose {
    let t = t.clamp(0.0, 1.0);
    PoseField::all().fold(*b, |pose, field| {
        pose.with_field(field, lerp_field(field.kind(), a.field(field), b.field(field), t))
    })
}

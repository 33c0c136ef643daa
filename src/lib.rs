//! 2D 关节体姿态引擎
//!
//! 模块划分（叶子在前）：
//! - skeleton: 关节层级、静止姿态、Pose、正向运动学、IK 求解器
//! - animation: 姿态插值、关键帧轨道播放
//! - physics: Verlet 布娃娃物理
//! - mode: 编辑 / 播放 / 物理 三态切换
//!
//! 渲染、输入分发、撤销历史都在本库之外，它们只消费 Pose / Skeleton。

pub mod animation;
pub mod mode;
pub mod physics;
pub mod skeleton;

use thiserror::Error;

pub use animation::{interpolate_poses, Easing, PoseKeyframe, PoseTrack, Playhead};
pub use mode::{Mode, PoseDriver};
pub use physics::{
    create_physics_body, extract_pose, step_physics_body, PhysicsBody, Ragdoll, RagdollConfig,
};
pub use skeleton::{
    compute_skeleton, solve_chain, solve_two_bone, JointId, Pose, Skeleton, TwoBoneSolution,
};

/// 二维点（骨架自身坐标系，y 轴向下）
pub type Point = glam::Vec2;

/// 引擎错误
///
/// 只用于 API 误用；逐帧路径上的退化几何一律跳过，不走错误。
#[derive(Debug, Error)]
pub enum PoseError {
    #[error("未知关节名: {0}")]
    UnknownJoint(String),

    #[error("链长度不匹配: 需要 {expected} 个点，实际 {actual} 个")]
    ChainLength { expected: usize, actual: usize },

    #[error("{child} 不是 {parent} 的子关节，链不连续")]
    BrokenChain { parent: JointId, child: JointId },

    #[error("当前模式 {mode:?} 下不能提交姿态")]
    ModeLocked { mode: Mode },

    #[error("关键帧轨道为空")]
    EmptyTrack,
}

pub type Result<T> = std::result::Result<T, PoseError>;

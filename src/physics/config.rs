//! 布娃娃物理配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 运行时可通过 `set_config` 整体替换；测试中用 `step_with` 直接传入配置。

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::skeleton::{JointFlags, Stage};

/// 物理配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct RagdollConfig {
    // ========== 重力 ==========
    /// 重力（单位/秒²，正值向下，y 轴向下），默认 2500.0
    pub gravity: f32,

    // ========== 积分与求解 ==========
    /// 速度保留系数（每步乘一次），默认 0.96
    pub friction: f32,
    /// 距离约束刚度（每次迭代修正的比例），默认 0.75
    pub stiffness: f32,
    /// 约束迭代次数，默认 15
    pub solver_iterations: usize,
    /// 单步最大时长（秒），卡顿帧被截断到此值，默认 0.05
    pub max_step: f32,
    /// 短于此值的骨段不建约束，默认 0.1
    pub min_constraint_length: f32,

    // ========== 质量 ==========
    /// 根、躯干、胯、肩
    pub primary_mass: f32,
    /// 腰、头
    pub pivot_mass: f32,
    /// 肘、膝、手、脚
    pub limb_mass: f32,

    // ========== 碰撞 ==========
    /// 舞台边界
    pub stage: Stage,
    /// 粒子半径（边界内缩量），默认 5.0
    pub particle_radius: f32,
    /// 落地时竖直速度转为水平滑动的比例，默认 0.15
    pub floor_slide: f32,

    // ========== 调试 ==========
    /// 是否输出逐步调试日志，默认 false
    pub debug_log: bool,
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            gravity: 2500.0,

            friction: 0.96,
            stiffness: 0.75,
            solver_iterations: 15,
            max_step: 0.05,
            min_constraint_length: 0.1,

            primary_mass: 3.0,
            pivot_mass: 1.5,
            limb_mass: 0.5,

            stage: Stage::DEFAULT,
            particle_radius: 5.0,
            floor_slide: 0.15,

            debug_log: false,
        }
    }
}

impl RagdollConfig {
    /// 按关节角色取质量
    pub fn mass_for(&self, flags: JointFlags) -> f32 {
        if flags.contains(JointFlags::PRIMARY) {
            self.primary_mass
        } else if flags.contains(JointFlags::PIVOT) {
            self.pivot_mass
        } else {
            self.limb_mass
        }
    }

    /// 地板高度（粒子中心能到达的最大 y）
    #[inline]
    pub fn floor(&self) -> f32 {
        self.stage.height - self.particle_radius
    }
}

/// 全局配置实例
static RAGDOLL_CONFIG: Lazy<RwLock<RagdollConfig>> =
    Lazy::new(|| RwLock::new(RagdollConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> RagdollConfig {
    RAGDOLL_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: RagdollConfig) {
    *RAGDOLL_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *RAGDOLL_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = RagdollConfig::default();
}

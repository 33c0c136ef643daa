//! 布娃娃物理
//!
//! 流程：create_physics_body（进入物理模式时一次）→ 每帧 [step_physics_body → extract_pose]
//! → 退出物理模式时丢弃粒子体。

mod config;
mod ragdoll;

pub use config::{get_config, reset_config, set_config, RagdollConfig};
pub use ragdoll::{
    create_physics_body, extract_pose, step_physics_body, DistanceConstraint, Particle,
    PhysicsBody, Ragdoll,
};

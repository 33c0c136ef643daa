//! Verlet 布娃娃
//!
//! 每个关节一个粒子，每条层级边一个距离约束。
//! 每步流程：integrate → 约束迭代 → 边界碰撞。
//! 姿态与粒子体是同一构型的两种表示：`from_pose` / `extract_pose` 互为往返，
//! 角度换算一律走最短弧，保证画面连续。

use glam::Vec2;

use super::config::{get_config, RagdollConfig};
use crate::skeleton::{compute_skeleton_on, reconcile_angle, JointId, Pose, HIERARCHY};
use crate::Point;

/// 约束两端距离低于此值时视为重合，跳过本次修正
const DEGENERATE_SEPARATION: f32 = 0.001;

/// 提取姿态时父子粒子距离低于此值，沿用上一帧角度
const EXTRACT_EPSILON: f32 = 1e-4;

/// 粒子
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub id: JointId,
    pub pos: Point,
    pub prev_pos: Point,
    /// 0 表示固定不动
    pub mass: f32,
}

impl Particle {
    /// 隐式速度（每步位移）
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev_pos
    }

    #[inline]
    fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }
}

/// 距离约束
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceConstraint {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
}

/// 粒子体
#[derive(Clone, Debug)]
pub struct PhysicsBody {
    pub particles: Vec<Particle>,
    pub constraints: Vec<DistanceConstraint>,
    joint_to_particle: [usize; JointId::COUNT],
}

impl PhysicsBody {
    /// 用全局配置从姿态构建
    pub fn from_pose(pose: &Pose) -> Self {
        Self::from_pose_with(pose, &get_config())
    }

    /// 从姿态构建：粒子放在正向运动学的关节位置上，初速度为 0
    pub fn from_pose_with(pose: &Pose, config: &RagdollConfig) -> Self {
        let skeleton = compute_skeleton_on(pose, &config.stage);

        let mut particles = Vec::with_capacity(JointId::COUNT);
        let mut joint_to_particle = [0; JointId::COUNT];
        for joint in JointId::ALL {
            let pos = skeleton.position(joint);
            joint_to_particle[joint.index()] = particles.len();
            particles.push(Particle {
                id: joint,
                pos,
                prev_pos: pos,
                mass: config.mass_for(joint.flags()),
            });
        }

        let mut constraints = Vec::with_capacity(JointId::COUNT - 1);
        for def in HIERARCHY.iter() {
            let Some(parent) = def.parent else {
                continue;
            };
            let a = joint_to_particle[parent.index()];
            let b = joint_to_particle[def.id.index()];
            let rest_length = (particles[b].pos - particles[a].pos).length();
            if rest_length < config.min_constraint_length {
                log::debug!("跳过退化约束 {} -> {} (长度 {})", parent, def.id, rest_length);
                continue;
            }
            constraints.push(DistanceConstraint { a, b, rest_length });
        }

        log::debug!(
            "布娃娃构建完成: {} 粒子, {} 约束",
            particles.len(),
            constraints.len()
        );

        Self {
            particles,
            constraints,
            joint_to_particle,
        }
    }

    #[inline]
    pub fn particle_index(&self, joint: JointId) -> usize {
        self.joint_to_particle[joint.index()]
    }

    #[inline]
    pub fn particle(&self, joint: JointId) -> &Particle {
        &self.particles[self.particle_index(joint)]
    }

    /// 给关节粒子附加一个每步位移（甩动、拖拽松手）
    pub fn apply_impulse(&mut self, joint: JointId, velocity: Vec2) {
        let i = self.particle_index(joint);
        self.particles[i].prev_pos -= velocity;
    }

    // ========================================
    // 步进
    // ========================================

    /// 用全局配置步进
    pub fn step(&mut self, dt: f32) {
        self.step_with(dt, &get_config());
    }

    /// 步进一帧
    pub fn step_with(&mut self, dt: f32, config: &RagdollConfig) {
        let dt = dt.clamp(0.0, config.max_step);

        self.integrate(dt, config);
        for _ in 0..config.solver_iterations {
            self.solve_constraints(config.stiffness);
        }
        self.collide(config);

        if config.debug_log {
            let root = self.particle(JointId::Root);
            log::trace!("布娃娃步进 dt={dt}: root=({}, {})", root.pos.x, root.pos.y);
        }
    }

    /// 半隐式 Verlet：v = (pos - prev) * friction；prev = pos；pos += v + g·dt²
    fn integrate(&mut self, dt: f32, config: &RagdollConfig) {
        let gravity = Vec2::new(0.0, config.gravity) * (dt * dt);
        for p in &mut self.particles {
            if p.mass <= 0.0 {
                continue;
            }
            let velocity = p.velocity() * config.friction;
            p.prev_pos = p.pos;
            p.pos += velocity + gravity;
        }
    }

    /// 单轮距离约束松弛，修正按逆质量分配
    fn solve_constraints(&mut self, stiffness: f32) {
        for c in &self.constraints {
            let (pa, pb) = (self.particles[c.a], self.particles[c.b]);
            let delta = pb.pos - pa.pos;
            let separation = delta.length();
            if separation < DEGENERATE_SEPARATION {
                continue;
            }

            let (wa, wb) = (pa.inverse_mass(), pb.inverse_mass());
            let total = wa + wb;
            if total <= 0.0 {
                continue;
            }

            let ratio = (separation - c.rest_length) / separation;
            let correction = delta * ratio * stiffness;
            self.particles[c.a].pos += correction * (wa / total);
            self.particles[c.b].pos -= correction * (wb / total);
        }
    }

    /// 舞台边界碰撞
    ///
    /// 地板：夹到地板，竖直速度清零，并把一部分撞击速度转为沿当前水平方向的滑动。
    /// 天花板与两侧墙：夹回并清零对应分量。
    fn collide(&mut self, config: &RagdollConfig) {
        let r = config.particle_radius;
        let floor = config.floor();
        let right = config.stage.width - r;

        for p in &mut self.particles {
            if p.pos.y > floor {
                let impact = p.pos.y - p.prev_pos.y;
                p.pos.y = floor;
                p.prev_pos.y = floor;

                let vx = p.pos.x - p.prev_pos.x;
                if vx != 0.0 {
                    p.prev_pos.x -= vx.signum() * impact.abs() * config.floor_slide;
                }
            } else if p.pos.y < r {
                p.pos.y = r;
                p.prev_pos.y = r;
            }

            if p.pos.x < r {
                p.pos.x = r;
                p.prev_pos.x = r;
            } else if p.pos.x > right {
                p.pos.x = right;
                p.prev_pos.x = right;
            }
        }
    }

    // ========================================
    // 姿态提取
    // ========================================

    /// 用全局配置提取姿态
    pub fn extract_pose(&self, previous: &Pose) -> Pose {
        self.extract_pose_with(previous, &get_config())
    }

    /// 从粒子位置反推姿态
    ///
    /// 每条父子边：child 世界角 = atan2(child - parent)，减去父世界角与静止角得到原始局部角，
    /// 再对齐到上一帧同一关节的局部角（差值不超过半圈）。
    /// 父子粒子重合时沿用上一帧角度。
    pub fn extract_pose_with(&self, previous: &Pose, config: &RagdollConfig) -> Pose {
        let root = self.particle(JointId::Root).pos;
        let mut pose = previous.with_offset(root - config.stage.center());
        let mut world = [0.0_f32; JointId::COUNT];

        for def in HIERARCHY.iter() {
            let Some(parent) = def.parent else {
                continue;
            };
            let d = self.particle(def.id).pos - self.particle(parent).pos;
            let parent_world = world[parent.index()];

            let local = if d.length() < EXTRACT_EPSILON {
                previous.angle(def.id)
            } else {
                let raw = d.y.atan2(d.x) - parent_world - def.base_angle;
                reconcile_angle(raw, previous.angle(def.id))
            };

            world[def.id.index()] = parent_world + def.base_angle + local;
            pose = pose.with_angle(def.id, local);
        }

        pose
    }
}

/// 从姿态创建粒子体
pub fn create_physics_body(pose: &Pose) -> PhysicsBody {
    PhysicsBody::from_pose(pose)
}

/// 原地步进粒子体
pub fn step_physics_body(body: &mut PhysicsBody, dt: f32) {
    body.step(dt);
}

/// 从粒子体提取姿态
pub fn extract_pose(body: &PhysicsBody, previous: &Pose) -> Pose {
    body.extract_pose(previous)
}

// ============================================================================
// 状态机
// ============================================================================

/// 布娃娃状态：Off → Running → Off
#[derive(Clone, Debug, Default)]
pub enum Ragdoll {
    #[default]
    Off,
    Running {
        body: PhysicsBody,
        /// 最近一次提取的姿态（下一帧角度对齐的参考）
        pose: Pose,
    },
}

impl Ragdoll {
    /// 从当前姿态启动；已在运行则重建
    pub fn activate(&mut self, pose: &Pose) {
        self.activate_with(pose, &get_config());
    }

    pub fn activate_with(&mut self, pose: &Pose, config: &RagdollConfig) {
        *self = Ragdoll::Running {
            body: PhysicsBody::from_pose_with(pose, config),
            pose: *pose,
        };
        log::info!("布娃娃启动");
    }

    /// 停止并丢弃粒子体，返回最后的姿态
    pub fn deactivate(&mut self) -> Option<Pose> {
        match std::mem::take(self) {
            Ragdoll::Running { pose, .. } => {
                log::info!("布娃娃停止");
                Some(pose)
            }
            Ragdoll::Off => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Ragdoll::Running { .. })
    }

    pub fn body(&self) -> Option<&PhysicsBody> {
        match self {
            Ragdoll::Running { body, .. } => Some(body),
            Ragdoll::Off => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut PhysicsBody> {
        match self {
            Ragdoll::Running { body, .. } => Some(body),
            Ragdoll::Off => None,
        }
    }

    /// 步进一帧并提取姿态；Off 时返回 None
    pub fn tick(&mut self, dt: f32) -> Option<Pose> {
        self.tick_with(dt, &get_config())
    }

    pub fn tick_with(&mut self, dt: f32, config: &RagdollConfig) -> Option<Pose> {
        match self {
            Ragdoll::Running { body, pose } => {
                body.step_with(dt, config);
                *pose = body.extract_pose_with(pose, config);
                Some(*pose)
            }
            Ragdoll::Off => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::compute_skeleton;

    fn still_config() -> RagdollConfig {
        RagdollConfig {
            gravity: 0.0,
            friction: 1.0,
            stiffness: 1.0,
            ..RagdollConfig::default()
        }
    }

    fn bent_pose() -> Pose {
        Pose::t_pose()
            .with_offset(Vec2::new(-20.0, 35.0))
            .with_angle(JointId::Torso, 0.3)
            .with_angle(JointId::LeftElbow, 2.8)
            .with_angle(JointId::LeftHand, -3.1)
            .with_angle(JointId::RightKnee, -1.2)
            .with_angle(JointId::Head, 0.4)
    }

    #[test]
    fn test_body_layout() {
        let config = RagdollConfig::default();
        let pose = bent_pose();
        let body = PhysicsBody::from_pose_with(&pose, &config);
        let sk = compute_skeleton(&pose);

        assert_eq!(body.particles.len(), JointId::COUNT);
        assert_eq!(body.constraints.len(), JointId::COUNT - 1);
        for joint in JointId::ALL {
            let p = body.particle(joint);
            assert_eq!(p.id, joint);
            assert_eq!(p.pos, sk.position(joint));
            assert_eq!(p.velocity(), Vec2::ZERO);
        }
        for c in &body.constraints {
            let child = body.particles[c.b].id;
            assert!((c.rest_length - child.length()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_degenerate_edges_skipped() {
        let config = RagdollConfig {
            min_constraint_length: 16.0,
            ..RagdollConfig::default()
        };
        // 腰（15）、胯（12）两类边短于 16
        let body = PhysicsBody::from_pose_with(&Pose::t_pose(), &config);
        assert_eq!(body.constraints.len(), JointId::COUNT - 1 - 3);
    }

    #[test]
    fn test_zero_force_is_stable() {
        let config = still_config();
        let pose = bent_pose();
        let mut body = PhysicsBody::from_pose_with(&pose, &config);
        let before: Vec<Point> = body.particles.iter().map(|p| p.pos).collect();

        body.step_with(1.0 / 60.0, &config);

        for (p, b) in body.particles.iter().zip(&before) {
            assert!((p.pos - *b).length() < 1e-3);
        }
    }

    #[test]
    fn test_gravity_pulls_down() {
        let config = RagdollConfig::default();
        let mut body = PhysicsBody::from_pose_with(&Pose::t_pose(), &config);
        let y0 = body.particle(JointId::Root).pos.y;
        body.step_with(1.0 / 60.0, &config);
        assert!(body.particle(JointId::Root).pos.y > y0);
    }

    #[test]
    fn test_floor_landing() {
        let config = RagdollConfig::default();
        let floor = config.floor();
        let mut body = PhysicsBody::from_pose_with(&Pose::t_pose(), &config);

        // 让一只脚带着向下和向右的速度穿过地板
        let i = body.particle_index(JointId::LeftFoot);
        body.particles[i].pos = Vec2::new(300.0, floor - 1.0);
        body.particles[i].prev_pos = Vec2::new(298.0, floor - 40.0);
        body.constraints.clear();

        body.step_with(1.0 / 60.0, &config);

        let p = body.particles[i];
        assert_eq!(p.pos.y, floor);
        assert_eq!(p.prev_pos.y, p.pos.y);
        // 撞击速度的一部分转成了向右的滑动
        let expected_vx = 2.0 * config.friction + 39.0 * config.friction * config.floor_slide;
        assert!(p.velocity().x > 2.0 * config.friction);
        assert!(p.velocity().x <= expected_vx + 1.0);
    }

    #[test]
    fn test_walls_and_ceiling_clamp() {
        let config = still_config();
        let mut body = PhysicsBody::from_pose_with(&Pose::t_pose(), &config);
        body.constraints.clear();

        let l = body.particle_index(JointId::LeftHand);
        body.particles[l].pos = Vec2::new(-10.0, 100.0);
        body.particles[l].prev_pos = Vec2::new(5.0, 99.0);
        let h = body.particle_index(JointId::Head);
        body.particles[h].pos = Vec2::new(400.0, -3.0);
        body.particles[h].prev_pos = Vec2::new(401.0, 2.0);

        body.step_with(0.0, &config);

        let p = body.particles[l];
        assert_eq!(p.pos.x, config.particle_radius);
        assert_eq!(p.prev_pos.x, p.pos.x);
        // 竖直分量不受影响
        assert!((p.velocity().y - 1.0).abs() < 1e-4);

        let p = body.particles[h];
        assert_eq!(p.pos.y, config.particle_radius);
        assert_eq!(p.velocity().y, 0.0);
        assert!((p.velocity().x + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_mass_is_pinned() {
        let config = RagdollConfig {
            primary_mass: 0.0,
            ..RagdollConfig::default()
        };
        let mut body = PhysicsBody::from_pose_with(&Pose::t_pose(), &config);
        let root = body.particle(JointId::Root).pos;
        for _ in 0..10 {
            body.step_with(1.0 / 60.0, &config);
        }
        assert_eq!(body.particle(JointId::Root).pos, root);
        // 质量非零的末端照常下落
        assert!(body.particle(JointId::LeftHand).velocity().y > 0.0);
    }

    #[test]
    fn test_round_trip() {
        let config = RagdollConfig::default();
        for pose in [Pose::t_pose(), bent_pose(), bent_pose().mirrored()] {
            let body = PhysicsBody::from_pose_with(&pose, &config);
            let back = body.extract_pose_with(&pose, &config);
            assert!((back.offset - pose.offset).length() < 1e-3);
            for joint in JointId::ALL {
                assert!(
                    (back.angle(joint) - pose.angle(joint)).abs() < 1e-3,
                    "{joint}: {} != {}",
                    back.angle(joint),
                    pose.angle(joint)
                );
            }
        }
    }

    #[test]
    fn test_extract_follows_previous_winding() {
        let config = RagdollConfig::default();
        // 上一帧已经绕了一整圈多
        let wound = Pose::t_pose().with_angle(JointId::RightElbow, 7.0);
        let body = PhysicsBody::from_pose_with(&wound, &config);
        let back = body.extract_pose_with(&wound, &config);
        assert!((back.angle(JointId::RightElbow) - 7.0).abs() < 1e-3);
    }

    #[test]
    fn test_coincident_particles_stay_finite() {
        let config = RagdollConfig::default();
        let mut body = PhysicsBody::from_pose_with(&bent_pose(), &config);
        let elbow = body.particle(JointId::LeftElbow).pos;
        let h = body.particle_index(JointId::LeftHand);
        body.particles[h].pos = elbow;
        body.particles[h].prev_pos = elbow;

        body.step_with(1.0 / 60.0, &config);
        for p in &body.particles {
            assert!(p.pos.is_finite() && p.prev_pos.is_finite(), "{}", p.id);
        }

        let pose = body.extract_pose_with(&bent_pose(), &config);
        assert!(pose.offset.is_finite());
        for joint in JointId::ALL {
            assert!(pose.angle(joint).is_finite(), "{joint}");
        }
    }

    #[test]
    fn test_extract_holds_angle_when_coincident() {
        let config = RagdollConfig::default();
        let previous = bent_pose();
        let mut body = PhysicsBody::from_pose_with(&previous, &config);
        let elbow = body.particle(JointId::LeftElbow).pos;
        let h = body.particle_index(JointId::LeftHand);
        body.particles[h].pos = elbow;

        let pose = body.extract_pose_with(&previous, &config);
        assert_eq!(pose.angle(JointId::LeftHand), previous.angle(JointId::LeftHand));
        assert!((pose.angle(JointId::LeftElbow) - previous.angle(JointId::LeftElbow)).abs() < 1e-3);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let config = RagdollConfig::default();
        let mut body = PhysicsBody::from_pose_with(&Pose::t_pose(), &config);
        let y0 = body.particle(JointId::Root).pos.y;

        // 卡顿 10 秒只按 max_step 推进一步
        body.step_with(10.0, &config);
        let dy = body.particle(JointId::Root).pos.y - y0;
        let expected = config.gravity * config.max_step * config.max_step;
        assert!((dy - expected).abs() < 1e-2, "dy = {dy}, expected {expected}");
    }

    #[test]
    fn test_ragdoll_state_machine() {
        let config = RagdollConfig::default();
        let mut ragdoll = Ragdoll::default();
        assert!(!ragdoll.is_running());
        assert!(ragdoll.tick_with(0.016, &config).is_none());
        assert!(ragdoll.deactivate().is_none());

        ragdoll.activate(&Pose::t_pose());
        assert!(ragdoll.is_running());
        let pose = ragdoll.tick_with(0.016, &config).unwrap();
        assert!(pose.offset.y > 0.0);

        let last = ragdoll.deactivate().unwrap();
        assert_eq!(last, pose);
        assert!(ragdoll.body().is_none());
    }
}

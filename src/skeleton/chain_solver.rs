//! 多段链 IK（FABRIK）
//!
//! 首点为锚点。每次迭代：
//! 1. 后向：末端放到目标，逐段向锚点方向恢复段长
//! 2. 前向：锚点复位，逐段向末端方向恢复段长
//! 点的最大位移低于阈值或达到迭代上限时停止。

use glam::Vec2;

use super::forward::compute_skeleton;
use super::joint::JointId;
use super::pose::Pose;
use super::reconcile_angle;
use crate::{Point, PoseError, Result};

/// 链 IK 参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainIk {
    /// 迭代上限
    pub max_iterations: u32,
    /// 收敛阈值（单次迭代内点的最大位移）
    pub tolerance: f32,
}

impl Default for ChainIk {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
        }
    }
}

/// 单位方向，退化时沿用 `fallback`
#[inline]
fn direction(from: Point, to: Point, fallback: Vec2) -> Vec2 {
    let d = to - from;
    let len = d.length();
    if len > 1e-6 {
        d / len
    } else {
        fallback
    }
}

impl ChainIk {
    /// 求解，返回新的点列（长度与输入相同）
    pub fn solve(&self, points: &[Point], target: Point) -> Vec<Point> {
        let mut positions = points.to_vec();
        if positions.len() < 2 {
            return positions;
        }

        let lengths: Vec<f32> = points.windows(2).map(|w| (w[1] - w[0]).length()).collect();
        let total: f32 = lengths.iter().sum();
        let anchor = points[0];
        let last = positions.len() - 1;

        // 够不到：沿锚点→目标方向完全伸直
        if (target - anchor).length() > total {
            let dir = direction(anchor, target, Vec2::X);
            for i in 0..last {
                positions[i + 1] = positions[i] + dir * lengths[i];
            }
            return positions;
        }

        let mut previous = positions.clone();
        for _ in 0..self.max_iterations {
            // 后向
            positions[last] = target;
            for i in (0..last).rev() {
                let fallback = direction(previous[i + 1], previous[i], Vec2::X);
                let dir = direction(positions[i + 1], positions[i], fallback);
                positions[i] = positions[i + 1] + dir * lengths[i];
            }

            // 前向
            positions[0] = anchor;
            for i in 0..last {
                let fallback = direction(previous[i], previous[i + 1], Vec2::X);
                let dir = direction(positions[i], positions[i + 1], fallback);
                positions[i + 1] = positions[i] + dir * lengths[i];
            }

            let movement = positions
                .iter()
                .zip(&previous)
                .map(|(a, b)| (*a - *b).length())
                .fold(0.0_f32, f32::max);
            if movement < self.tolerance {
                break;
            }
            previous.copy_from_slice(&positions);
        }

        positions
    }
}

/// 以默认参数求解链 IK
pub fn solve_chain(points: &[Point], target: Point) -> Vec<Point> {
    ChainIk::default().solve(points, target)
}

impl Pose {
    /// 把链上各点的位置换算回局部角
    ///
    /// `chain` 必须是层级中连续的父子序列，`points[k]` 为 `chain[k]` 的新位置。
    /// 链首关节的角度不变，其余关节的局部角沿最短路径对齐到当前值。
    pub fn with_chain_points(&self, chain: &[JointId], points: &[Point]) -> Result<Pose> {
        if chain.len() != points.len() {
            return Err(PoseError::ChainLength {
                expected: chain.len(),
                actual: points.len(),
            });
        }
        validate_chain(chain)?;

        let Some(&first) = chain.first() else {
            return Ok(*self);
        };
        let mut parent_world = compute_skeleton(self).world_angle(first);
        let mut pose = *self;

        for (k, &joint) in chain.iter().enumerate().skip(1) {
            let d = points[k] - points[k - 1];
            let local = if d.length_squared() > 1e-12 {
                let raw = d.y.atan2(d.x) - parent_world - joint.base_angle();
                reconcile_angle(raw, self.angle(joint))
            } else {
                self.angle(joint)
            };
            pose = pose.with_angle(joint, local);
            parent_world += joint.base_angle() + local;
        }

        Ok(pose)
    }

    /// 用链 IK 拖动链末端，链首不动
    pub fn drag_chain(&self, chain: &[JointId], target: Point, solver: &ChainIk) -> Result<Pose> {
        validate_chain(chain)?;
        let skeleton = compute_skeleton(self);
        let points: Vec<Point> = chain.iter().map(|&j| skeleton.position(j)).collect();
        let solved = solver.solve(&points, target);
        self.with_chain_points(chain, &solved)
    }
}

fn validate_chain(chain: &[JointId]) -> Result<()> {
    for pair in chain.windows(2) {
        if pair[1].parent() != Some(pair[0]) {
            return Err(PoseError::BrokenChain {
                parent: pair[0],
                child: pair[1],
            });
        }
    }
    Ok(())
}

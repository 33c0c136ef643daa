//! 缓动曲线
//!
//! 关键帧之间的时间系数先经过缓动再交给姿态插值。
//! 三次贝塞尔与 CSS cubic-bezier 同义：P0 = (0,0)，P3 = (1,1)，控制点 c0 / c1。

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 曲线 trait
pub trait Curve {
    fn value(&self, x: f32) -> f32;
}

/// 三次贝塞尔缓动
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicBezier {
    /// 控制点1（x 必须在 0~1）
    pub c0: Vec2,
    /// 控制点2（x 必须在 0~1）
    pub c1: Vec2,
}

impl CubicBezier {
    /// x 方向反解的二分次数
    const SOLVE_STEPS: u32 = 24;

    pub fn new(c0: Vec2, c1: Vec2) -> Self {
        Self {
            c0: Vec2::new(c0.x.clamp(0.0, 1.0), c0.y),
            c1: Vec2::new(c1.x.clamp(0.0, 1.0), c1.y),
        }
    }

    /// 参数 s 处的曲线点
    fn sample(&self, s: f32) -> Vec2 {
        let is = 1.0 - s;
        // B(s) = 3(1-s)²s·c0 + 3(1-s)s²·c1 + s³·P3
        self.c0 * (3.0 * is * is * s) + self.c1 * (3.0 * is * s * s) + Vec2::ONE * (s * s * s)
    }
}

impl Curve for CubicBezier {
    /// 给定 x 求 y；控制点 x 在 [0,1] 内时 x(s) 单调，可二分
    fn value(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        for _ in 0..Self::SOLVE_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.sample(mid).x < x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.sample(0.5 * (lo + hi)).y
    }
}

/// 关键帧缓动
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Easing {
    #[default]
    Linear,
    /// 进出平滑（smoothstep）
    Smooth,
    Bezier(CubicBezier),
}

impl Easing {
    pub fn ease_in_out() -> Self {
        Easing::Bezier(CubicBezier::new(Vec2::new(0.42, 0.0), Vec2::new(0.58, 1.0)))
    }

    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smooth => t * t * (3.0 - 2.0 * t),
            Easing::Bezier(curve) => curve.value(t),
        }
    }
}

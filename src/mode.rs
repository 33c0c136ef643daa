//! 显示姿态的驱动模式
//!
//! 编辑、播放、物理三者互斥，用一个枚举表示，不存在互相矛盾的开关组合。
//! `PoseDriver` 持有当前显示的姿态，每帧由外部回调 `tick` 推进。

use glam::Vec2;

use crate::animation::{Playhead, PoseTrack};
use crate::physics::{get_config, Ragdoll, RagdollConfig};
use crate::skeleton::{reach_limb, JointId, Limb, Pose, Side};
use crate::{Point, PoseError, Result};

/// 驱动模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// 编辑：只有提交会改变姿态
    #[default]
    Edit,
    /// 播放：关键帧轨道插值
    Playback,
    /// 物理：布娃娃模拟
    Physics,
}

/// 姿态驱动器
#[derive(Clone, Debug)]
pub struct PoseDriver {
    mode: Mode,
    pose: Pose,
    track: PoseTrack,
    playhead: Playhead,
    ragdoll: Ragdoll,
    config: RagdollConfig,
}

impl PoseDriver {
    pub fn new(pose: Pose) -> Self {
        Self {
            mode: Mode::Edit,
            pose,
            track: PoseTrack::new(),
            playhead: Playhead::default(),
            ragdoll: Ragdoll::Off,
            config: get_config(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RagdollConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_playhead(mut self, playhead: Playhead) -> Self {
        self.playhead = playhead;
        self
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 当前显示的姿态
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn track(&self) -> &PoseTrack {
        &self.track
    }

    pub fn track_mut(&mut self) -> &mut PoseTrack {
        &mut self.track
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    // ========================================
    // 编辑
    // ========================================

    /// 提交新姿态，只在编辑模式下允许
    pub fn commit(&mut self, pose: Pose) -> Result<()> {
        if self.mode != Mode::Edit {
            return Err(PoseError::ModeLocked { mode: self.mode });
        }
        self.pose = pose;
        Ok(())
    }

    /// 把肢体末端拖到目标点；目标无解时姿态不变，返回 false
    pub fn reach(&mut self, side: Side, limb: Limb, target: Point) -> Result<bool> {
        match reach_limb(&self.pose, side, limb, target) {
            Some(pose) => self.commit(pose).map(|_| true),
            None if self.mode != Mode::Edit => Err(PoseError::ModeLocked { mode: self.mode }),
            None => Ok(false),
        }
    }

    /// 物理模式下甩动一个关节
    pub fn fling(&mut self, joint: JointId, velocity: Vec2) -> bool {
        match self.ragdoll.body_mut() {
            Some(body) => {
                body.apply_impulse(joint, velocity);
                true
            }
            None => false,
        }
    }

    // ========================================
    // 模式切换
    // ========================================

    /// 切换模式
    ///
    /// - 进入播放：轨道为空时报错，模式不变
    /// - 进入物理：从当前显示姿态构建粒子体
    /// - 离开物理：丢弃粒子体，保留最后一帧姿态
    pub fn enter(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        if mode == Mode::Playback && self.track.is_empty() {
            return Err(PoseError::EmptyTrack);
        }

        if let Some(last) = self.ragdoll.deactivate() {
            self.pose = last;
        }

        match mode {
            Mode::Edit => {}
            Mode::Playback => {
                self.playhead.frame = 0.0;
                self.pose = self.track.seek(0.0)?;
            }
            Mode::Physics => self.ragdoll.activate_with(&self.pose, &self.config),
        }

        log::info!("模式切换: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// 每帧推进，返回当前显示的姿态
    pub fn tick(&mut self, dt: f32) -> &Pose {
        match self.mode {
            Mode::Edit => {}
            Mode::Playback => {
                let frame = self.playhead.advance(dt, self.track.max_frame_index());
                match self.track.seek(frame) {
                    Ok(pose) => self.pose = pose,
                    Err(e) => log::warn!("播放求值失败，保持上一帧: {e}"),
                }
            }
            Mode::Physics => {
                if let Some(pose) = self.ragdoll.tick_with(dt, &self.config) {
                    self.pose = pose;
                }
            }
        }
        &self.pose
    }
}

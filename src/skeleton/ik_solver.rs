//! 两段解析 IK
//!
//! 余弦定理闭式求解，始终选择同一侧的弯曲解，不会在两个镜像解之间跳变。
//! 不可达时：过远则完全伸直指向目标；过近则把目标沿原方向推到 |l1 - l2|。

use std::f32::consts::PI;

use super::forward::compute_skeleton;
use super::joint::{limb_lengths, JointId, Limb, Side};
use super::pose::Pose;
use super::reconcile_angle;
use crate::Point;

/// 根与目标重合的判定距离
const COINCIDENT_EPSILON: f32 = 1e-4;

/// 两段 IK 的解
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoBoneSolution {
    /// 第一段的世界角
    pub angle1: f32,
    /// 第二段相对第一段的弯曲角，0 = 伸直
    pub angle2: f32,
}

/// 求解两段 IK
///
/// 目标与根重合、或任一段长度退化为 0 时没有确定解，返回 None，
/// 调用方应保持原姿态不变。
pub fn solve_two_bone(root: Point, target: Point, l1: f32, l2: f32) -> Option<TwoBoneSolution> {
    if l1 < COINCIDENT_EPSILON || l2 < COINCIDENT_EPSILON {
        return None;
    }

    let to_target = target - root;
    let distance = to_target.length();
    if distance < COINCIDENT_EPSILON {
        return None;
    }

    let bearing = to_target.y.atan2(to_target.x);

    // 过远：完全伸直
    if distance > l1 + l2 {
        return Some(TwoBoneSolution {
            angle1: bearing,
            angle2: 0.0,
        });
    }

    // 过近：沿原方向推到最小可达距离
    let min_reach = (l1 - l2).abs();
    let d = distance.max(min_reach);

    // 关节处内角
    let cos_interior = ((l1 * l1 + l2 * l2 - d * d) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
    let interior = cos_interior.acos();

    // 根→目标连线与第一段的夹角
    let cos_alpha = ((l1 * l1 + d * d - l2 * l2) / (2.0 * l1 * d)).clamp(-1.0, 1.0);
    let alpha = cos_alpha.acos();

    Some(TwoBoneSolution {
        angle1: bearing - alpha,
        angle2: PI - interior,
    })
}

/// 把肢体末端拖到目标点，返回新姿态
///
/// 锚点（肩 / 胯）不动，改写中间关节与末端关节的局部角。
/// 新角度沿最短路径对齐到原角度，避免跨 ±π 跳变。
pub fn reach_limb(pose: &Pose, side: Side, limb: Limb, target: Point) -> Option<Pose> {
    let [anchor, middle, end] = JointId::limb(side, limb);
    let (l1, l2) = limb_lengths(limb);

    let skeleton = compute_skeleton(pose);
    let solution = solve_two_bone(skeleton.position(anchor), target, l1, l2)?;

    let anchor_world = skeleton.world_angle(anchor);
    let middle_local = solution.angle1 - anchor_world - middle.base_angle();
    let end_local = solution.angle2 - end.base_angle();

    Some(
        pose.with_angle(middle, reconcile_angle(middle_local, pose.angle(middle)))
            .with_angle(end, reconcile_angle(end_local, pose.angle(end))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn end_point(root: Point, s: TwoBoneSolution, l1: f32, l2: f32) -> Point {
        let a2 = s.angle1 + s.angle2;
        root + Vec2::new(s.angle1.cos(), s.angle1.sin()) * l1 + Vec2::new(a2.cos(), a2.sin()) * l2
    }

    #[test]
    fn test_full_reach_is_straight() {
        let s = solve_two_bone(Vec2::ZERO, Vec2::new(200.0, 0.0), 100.0, 100.0).unwrap();
        assert!(s.angle1.abs() < 1e-3);
        assert!(s.angle2.abs() < 1e-3);
    }

    #[test]
    fn test_too_far_extends_toward_target() {
        let s = solve_two_bone(Vec2::ZERO, Vec2::new(0.0, 500.0), 100.0, 100.0).unwrap();
        assert!((s.angle1 - PI / 2.0).abs() < 1e-5);
        assert_eq!(s.angle2, 0.0);
    }

    #[test]
    fn test_too_close_uses_min_reach() {
        let root = Vec2::new(5.0, 5.0);
        let target = root + Vec2::new(10.0, 0.0);
        let s = solve_two_bone(root, target, 100.0, 50.0).unwrap();
        let end = end_point(root, s, 100.0, 50.0);
        assert!(((end - root).length() - 50.0).abs() < 1e-2);
        // 方向保持
        assert!((end - root).normalize().dot(Vec2::X) > 0.999);
    }

    #[test]
    fn test_reachable_hits_target() {
        let root = Vec2::new(10.0, -20.0);
        for target in [
            Vec2::new(80.0, 40.0),
            Vec2::new(-60.0, 10.0),
            Vec2::new(10.0, 100.0),
        ] {
            let s = solve_two_bone(root, target, 70.0, 60.0).unwrap();
            assert!((end_point(root, s, 70.0, 60.0) - target).length() < 1e-2);
            // 始终弯向同一侧
            assert!(s.angle2 >= 0.0);
        }
    }

    #[test]
    fn test_coincident_is_none() {
        assert!(solve_two_bone(Vec2::ONE, Vec2::ONE, 10.0, 10.0).is_none());
    }

    #[test]
    fn test_zero_length_segment_is_none() {
        let target = Vec2::new(5.0, 0.0);
        assert!(solve_two_bone(Vec2::ZERO, target, 0.0, 10.0).is_none());
        assert!(solve_two_bone(Vec2::ZERO, target, 10.0, 0.0).is_none());
        assert!(solve_two_bone(Vec2::ZERO, target, -3.0, 10.0).is_none());
    }

    #[test]
    fn test_reach_limb_moves_hand() {
        let pose = Pose::t_pose();
        let sk = compute_skeleton(&pose);
        let shoulder = sk.position(JointId::RightShoulder);
        let target = shoulder + Vec2::new(40.0, 50.0);

        let moved = reach_limb(&pose, Side::Right, Limb::Arm, target).unwrap();
        let hand = compute_skeleton(&moved).position(JointId::RightHand);
        assert!((hand - target).length() < 1e-2);
        // 锚点与其他肢体不动
        assert_eq!(moved.angle(JointId::RightShoulder), pose.angle(JointId::RightShoulder));
        assert_eq!(moved.limb(Side::Left, Limb::Leg), pose.limb(Side::Left, Limb::Leg));
    }

    #[test]
    fn test_reach_limb_on_anchor_is_none() {
        let pose = Pose::t_pose();
        let hip = compute_skeleton(&pose).position(JointId::LeftHip);
        assert!(reach_limb(&pose, Side::Left, Limb::Leg, hip).is_none());
    }
}

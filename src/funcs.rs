/*
  Copyright 2017 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/
use crate::chain::*;
use crate::errors::*;
use crate::robot::*;
use crate::symbolic::*;
use crate::transform::*;
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Symbolic matrix and the joints whose variables it depends on
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicMatrix {
    pub matrix: SymMatrix,
    /// Movable joints, in the order of the function parameters
    pub dofs: Vec<JointId>,
}

/// Transform of one joint in one direction
pub fn joint_transform(builder: &mut TransformBuilder, step: ChainStep) -> Result<KinematicMatrix> {
    let matrix = builder.step(step)?;
    let dofs = if builder.robot().joint(step.joint).is_movable() {
        vec![step.joint]
    } else {
        vec![]
    };
    Ok(KinematicMatrix { matrix, dofs })
}

/// Cumulative transforms along the chain, `result[i]` maps the frame after
/// `i` steps to the origin frame
fn cumulative_transforms(builder: &mut TransformBuilder, chain: &Chain) -> Result<Vec<SymMatrix>> {
    let mut cumulative = vec![builder.arena_mut().identity(4)];
    for step in chain.steps() {
        let t = builder.step(*step)?;
        let last = &cumulative[cumulative.len() - 1];
        let next = builder.arena_mut().matmul(last, &t);
        cumulative.push(next);
    }
    Ok(cumulative)
}

/// Transform from the destination frame to the origin frame of the chain
///
/// The identity for an empty chain.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use symkin::*;
///
/// let robot = Robot::from_dh_rows(
///     "planar",
///     Convention::standard(),
///     vec![
///         DhRow::new("j1", DhParameters::new(0.0, DhValue::Variable, 1.0, 0.0)),
///         DhRow::new("j2", DhParameters::new(0.0, DhValue::Variable, 1.0, 0.0)),
///     ],
/// )
/// .unwrap();
/// let chain = robot.resolve_chain("base", "link_2").unwrap();
/// let mut builder = TransformBuilder::new(&robot);
/// let fk = forward_kinematics(&mut builder, &chain).unwrap();
/// let values = HashMap::from([
///     ("theta_j1".to_owned(), std::f64::consts::FRAC_PI_2),
///     ("theta_j2".to_owned(), 0.0),
/// ]);
/// let t = builder.arena().eval_matrix(&fk.matrix, &values).unwrap();
/// assert!((t[(0, 3)] - 0.0).abs() < 1e-10);
/// assert!((t[(1, 3)] - 2.0).abs() < 1e-10);
/// ```
pub fn forward_kinematics(builder: &mut TransformBuilder, chain: &Chain) -> Result<KinematicMatrix> {
    let mut cumulative = cumulative_transforms(builder, chain)?;
    let matrix = cumulative.pop().unwrap_or_else(|| builder.arena_mut().identity(4));
    Ok(KinematicMatrix {
        matrix,
        dofs: chain.movable_steps(builder.robot()).map(|s| s.joint).collect(),
    })
}

/// Calculate the geometric Jacobian of the chain, in the origin frame
///
/// Rows are the linear velocity (x, y, z) then the angular velocity
/// (x, y, z) of the destination. One column per movable joint, in chain
/// order. A chain without movable joint gives a 6×0 matrix.
pub fn jacobian(builder: &mut TransformBuilder, chain: &Chain) -> Result<KinematicMatrix> {
    let cumulative = cumulative_transforms(builder, chain)?;
    let p_n = translation(&cumulative[cumulative.len() - 1]);
    let mut columns = Vec::new();
    let mut dofs = Vec::new();
    for (i, step) in chain.steps().iter().enumerate() {
        let motion = match builder.motion(*step)? {
            Some(motion) => motion,
            None => continue,
        };
        let arena = builder.arena_mut();
        let frame = arena.matmul(&cumulative[i], &motion.prefix);
        let sign = arena.constant(motion.sign);
        let a_i = column3(&frame, motion.axis.column());
        let a_i = arena.scale3(sign, &a_i);
        let zero = arena.zero();
        let column = if motion.rotational {
            let p_i = translation(&frame);
            let d = arena.sub3(&p_n, &p_i);
            let dp_i = arena.cross(&a_i, &d);
            [dp_i[0], dp_i[1], dp_i[2], a_i[0], a_i[1], a_i[2]]
        } else {
            [a_i[0], a_i[1], a_i[2], zero, zero, zero]
        };
        columns.push(column);
        dofs.push(step.joint);
    }
    let matrix = DMatrix::from_fn(6, columns.len(), |r, c| columns[c][r]);
    Ok(KinematicMatrix { matrix, dofs })
}

/// Transform from every link frame to the root frame
fn world_transforms(builder: &mut TransformBuilder) -> Result<HashMap<LinkId, SymMatrix>> {
    let robot = builder.robot();
    let mut world = HashMap::new();
    for link in robot.descendants(robot.root()) {
        let t = match robot.parent_joint(link) {
            None => builder.arena_mut().identity(4),
            Some(joint) => {
                let parent = &world[&robot.joint(joint).parent()];
                let local = builder.forward(joint)?;
                builder.arena_mut().matmul(parent, &local)
            }
        };
        world.insert(link, t);
    }
    Ok(world)
}

/// Center of mass of every massive link in the root frame, with its mass ratio
fn mass_points(
    builder: &mut TransformBuilder,
    world: &HashMap<LinkId, SymMatrix>,
) -> Result<Vec<(LinkId, f64, [ExprId; 3])>> {
    let robot = builder.robot();
    let total_mass = robot.total_mass();
    if total_mass <= 0.0 {
        return Err(Error::UndefinedCenterOfMass {
            robot_name: robot.name().to_owned(),
        });
    }
    let arena = builder.arena_mut();
    let mut points = Vec::new();
    for link_id in robot.descendants(robot.root()) {
        let link = robot.link(link_id);
        if !link.has_mass() {
            continue;
        }
        let t = &world[&link_id];
        let com = link.com;
        let mut p = [arena.zero(); 3];
        for (r, p_r) in p.iter_mut().enumerate() {
            let mut terms = vec![t[(r, 3)]];
            for k in 0..3 {
                let c = arena.constant(com[k]);
                terms.push(arena.mul(t[(r, k)], c));
            }
            *p_r = arena.sum(terms);
        }
        points.push((link_id, link.mass / total_mass, p));
    }
    Ok(points)
}

/// Calculate the center of mass of the robot in the root frame, as a 3×1 matrix
///
/// It fails with `Error::UndefinedCenterOfMass` if the robot has no mass.
pub fn center_of_mass(builder: &mut TransformBuilder) -> Result<KinematicMatrix> {
    let robot = builder.robot();
    let world = world_transforms(builder)?;
    let points = mass_points(builder, &world)?;
    let massive = points.iter().map(|(link, _, _)| *link).collect::<HashSet<_>>();
    let arena = builder.arena_mut();
    let mut com = DMatrix::from_element(3, 1, arena.zero());
    for r in 0..3 {
        let terms = points
            .iter()
            .map(|(_, ratio, p)| {
                let ratio = arena.constant(*ratio);
                arena.mul(ratio, p[r])
            })
            .collect::<Vec<_>>();
        com[(r, 0)] = arena.sum(terms);
    }
    let dofs = center_of_mass_dofs(robot, &massive);
    debug!(links = points.len(), dof = dofs.len(), "center of mass built");
    Ok(KinematicMatrix { matrix: com, dofs })
}

/// Movable joints, in tree pre-order, carrying at least one massive link
fn center_of_mass_dofs(robot: &Robot, massive: &HashSet<LinkId>) -> Vec<JointId> {
    robot
        .movable_joints()
        .into_iter()
        .filter(|j| {
            robot
                .descendants(robot.joint(*j).child())
                .any(|link| massive.contains(&link))
        })
        .collect()
}

/// Calculate the 3×N Jacobian of the center of mass in the root frame
///
/// Columns follow the movable joints in tree pre-order, skipping the joints
/// which move no mass.
pub fn center_of_mass_jacobian(builder: &mut TransformBuilder) -> Result<KinematicMatrix> {
    let robot = builder.robot();
    let world = world_transforms(builder)?;
    let points = mass_points(builder, &world)?;
    let massive = points.iter().map(|(link, _, _)| *link).collect::<HashSet<_>>();
    let dofs = center_of_mass_dofs(robot, &massive);
    let mut columns = Vec::with_capacity(dofs.len());
    for joint in &dofs {
        let step = ChainStep {
            joint: *joint,
            direction: Direction::Forward,
        };
        let motion = match builder.motion(step)? {
            Some(motion) => motion,
            None => continue,
        };
        let moved = robot
            .descendants(robot.joint(*joint).child())
            .collect::<HashSet<_>>();
        let arena = builder.arena_mut();
        let parent = &world[&robot.joint(*joint).parent()];
        let frame = arena.matmul(parent, &motion.prefix);
        let a_i = column3(&frame, motion.axis.column());
        let p_i = translation(&frame);
        let mut column = [Vec::new(), Vec::new(), Vec::new()];
        for (link, ratio, p) in &points {
            if !moved.contains(link) {
                continue;
            }
            let ratio = arena.constant(*ratio);
            let v = if motion.rotational {
                let d = arena.sub3(p, &p_i);
                arena.cross(&a_i, &d)
            } else {
                a_i
            };
            let v = arena.scale3(ratio, &v);
            for (acc, v) in column.iter_mut().zip(v) {
                acc.push(v);
            }
        }
        let [x, y, z] = column;
        columns.push([arena.sum(x), arena.sum(y), arena.sum(z)]);
    }
    let matrix = DMatrix::from_fn(3, columns.len(), |r, c| columns[c][r]);
    Ok(KinematicMatrix { matrix, dofs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::*;
    use crate::link::*;
    use nalgebra::Vector3;

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_update_center_of_mass() {
        let robot = RobotBuilder::new("r")
            .link(LinkBuilder::new().name("l0").mass(1.0))
            .link(
                LinkBuilder::new()
                    .name("l1")
                    .mass(4.0)
                    .com(Vector3::new(1.0, 0.0, 0.0)),
            )
            .joint(
                JointBuilder::new()
                    .name("j1")
                    .parent("l0")
                    .child("l1")
                    .offset(1.0)
                    .angle(DhValue::Variable),
            )
            .finalize()
            .unwrap();
        let mut builder = TransformBuilder::new(&robot);
        let com = center_of_mass(&mut builder).unwrap();
        assert_eq!(com.matrix.shape(), (3, 1));
        assert_eq!(com.dofs.len(), 1);
        let com1 = builder
            .arena()
            .eval_matrix(&com.matrix, &values(&[("theta_j1", 0.0)]))
            .unwrap();
        assert!((com1[(0, 0)] - 0.8).abs() < 0.0001);
        assert!((com1[(1, 0)] - 0.0).abs() < 0.0001);
        assert!((com1[(2, 0)] - 0.8).abs() < 0.0001);
        let com2 = builder
            .arena()
            .eval_matrix(&com.matrix, &values(&[("theta_j1", 0.5)]))
            .unwrap();
        assert!((com2[(0, 0)] - 0.8 * 0.5f64.cos()).abs() < 0.0001);
        assert!((com2[(1, 0)] - 0.8 * 0.5f64.sin()).abs() < 0.0001);

        let jacobian = center_of_mass_jacobian(&mut builder).unwrap();
        assert_eq!(jacobian.matrix.shape(), (3, 1));
        let j = builder
            .arena()
            .eval_matrix(&jacobian.matrix, &values(&[("theta_j1", 0.5)]))
            .unwrap();
        assert!((j[(0, 0)] + 0.8 * 0.5f64.sin()).abs() < 0.0001);
        assert!((j[(1, 0)] - 0.8 * 0.5f64.cos()).abs() < 0.0001);
        assert!(j[(2, 0)].abs() < 0.0001);
    }

    #[test]
    fn test_massless() {
        let robot = Robot::from_dh_rows(
            "r",
            Convention::standard(),
            vec![DhRow::new("j", DhParameters::new(0.0, DhValue::Variable, 1.0, 0.0))],
        )
        .unwrap();
        let mut builder = TransformBuilder::new(&robot);
        assert!(matches!(
            center_of_mass(&mut builder),
            Err(Error::UndefinedCenterOfMass { .. })
        ));
        assert!(center_of_mass_jacobian(&mut builder).is_err());
    }

    #[test]
    fn test_prismatic_jacobian() {
        let robot = Robot::from_dh_rows(
            "r",
            Convention::standard(),
            vec![DhRow::new("slide", DhParameters::new(DhValue::Variable, 0.0, 0.0, 0.0))],
        )
        .unwrap();
        let chain = robot.resolve_chain("base", "link_1").unwrap();
        let mut builder = TransformBuilder::new(&robot);
        let j = jacobian(&mut builder, &chain).unwrap();
        let j = builder
            .arena()
            .eval_matrix(&j.matrix, &values(&[("d_slide", 0.3)]))
            .unwrap();
        assert_eq!(j.as_slice(), &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }
}

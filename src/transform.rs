/*
  Copyright 2020 Takashi Ogura

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
//! Symbolic homogeneous transforms of joints
use crate::chain::*;
use crate::errors::*;
use crate::joint::*;
use crate::robot::*;
use crate::symbolic::*;
use std::collections::HashMap;

/// How a joint variable moves the frames after it
#[derive(Clone, Debug)]
pub struct Motion {
    /// Transform from the frame before the step to the frame in which the
    /// variable step is applied
    pub prefix: SymMatrix,
    /// Axis of the variable step
    pub axis: Axis,
    /// `-1.0` when the step is traversed backward
    pub sign: f64,
    /// `true` for a rotation, `false` for a translation
    pub rotational: bool,
}

/// Build and cache the transform of every joint of a robot
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use symkin::*;
///
/// let robot = Robot::from_dh_rows(
///     "one",
///     Convention::standard(),
///     vec![DhRow::new("j", DhParameters::new(0.5, DhValue::Variable, 0.0, 0.0))],
/// )
/// .unwrap();
/// let joint = robot.find_joint("j").unwrap();
/// let mut builder = TransformBuilder::new(&robot);
/// let t = builder.forward(joint).unwrap();
/// let values = HashMap::from([("theta_j".to_owned(), 0.0)]);
/// let t = builder.arena().eval_matrix(&t, &values).unwrap();
/// assert_eq!(t[(2, 3)], 0.5);
/// ```
#[derive(Debug)]
pub struct TransformBuilder<'a> {
    robot: &'a Robot,
    arena: ExprArena,
    cache: HashMap<ChainStep, SymMatrix>,
}

impl<'a> TransformBuilder<'a> {
    pub fn new(robot: &'a Robot) -> Self {
        Self::with_arena(robot, ExprArena::new())
    }

    pub fn with_arena(robot: &'a Robot, arena: ExprArena) -> Self {
        Self {
            robot,
            arena,
            cache: HashMap::new(),
        }
    }

    pub fn robot(&self) -> &'a Robot {
        self.robot
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }

    pub fn into_arena(self) -> ExprArena {
        self.arena
    }

    /// Symbol of the joint variable, `None` for a fixed joint
    pub fn variable(&mut self, joint: JointId) -> Result<Option<ExprId>> {
        let name = self.robot.joint(joint).checked_variable_name()?;
        Ok(name.map(|name| self.arena.variable(&name)))
    }

    /// Elementary transform of one step of the convention
    pub fn elementary(&mut self, step: Step, value: ExprId) -> SymMatrix {
        let mut m = self.arena.identity(4);
        match step {
            Step::Translation { axis, .. } => {
                m[(axis.column(), 3)] = value;
            }
            Step::Rotation { axis, .. } => {
                let c = self.arena.cos(value);
                let s = self.arena.sin(value);
                let minus_s = self.arena.neg(s);
                // rows and columns of the plane rotated by the step
                let (i, j) = match axis {
                    Axis::Z => (0, 1),
                    Axis::X => (1, 2),
                };
                m[(i, i)] = c;
                m[(i, j)] = minus_s;
                m[(j, i)] = s;
                m[(j, j)] = c;
            }
        }
        m
    }

    /// Value of every step of the convention for `joint`
    fn step_values(&mut self, joint: JointId) -> Result<[(Step, ExprId); 4]> {
        let variable = self.variable(joint)?;
        let dh = self.robot.joint(joint).dh;
        let steps = *self.robot.convention().steps();
        let mut value = |step: Step| match dh.get(step.parameter()) {
            DhValue::Constant(c) => self.arena.constant(c),
            DhValue::Variable => variable.unwrap_or_else(|| self.arena.zero()),
        };
        Ok([
            (steps[0], value(steps[0])),
            (steps[1], value(steps[1])),
            (steps[2], value(steps[2])),
            (steps[3], value(steps[3])),
        ])
    }

    fn product_of(&mut self, matrices: impl IntoIterator<Item = SymMatrix>) -> SymMatrix {
        let mut out = self.arena.identity(4);
        for m in matrices {
            out = self.arena.matmul(&out, &m);
        }
        out
    }

    /// Transform from the parent link frame to the child link frame
    pub fn forward(&mut self, joint: JointId) -> Result<SymMatrix> {
        let key = ChainStep {
            joint,
            direction: Direction::Forward,
        };
        if let Some(m) = self.cache.get(&key) {
            return Ok(m.clone());
        }
        let values = self.step_values(joint)?;
        let elementary = values
            .iter()
            .map(|(step, value)| self.elementary(*step, *value))
            .collect::<Vec<_>>();
        let m = self.product_of(elementary);
        self.cache.insert(key, m.clone());
        Ok(m)
    }

    /// Transform from the child link frame to the parent link frame
    pub fn backward(&mut self, joint: JointId) -> Result<SymMatrix> {
        let key = ChainStep {
            joint,
            direction: Direction::Backward,
        };
        if let Some(m) = self.cache.get(&key) {
            return Ok(m.clone());
        }
        let forward = self.forward(joint)?;
        let m = self.arena.rigid_inverse(&forward);
        self.cache.insert(key, m.clone());
        Ok(m)
    }

    pub fn step(&mut self, step: ChainStep) -> Result<SymMatrix> {
        match step.direction {
            Direction::Forward => self.forward(step.joint),
            Direction::Backward => self.backward(step.joint),
        }
    }

    /// Where and along which axis the variable of `step` acts
    ///
    /// Returns `None` for a fixed joint.
    pub fn motion(&mut self, step: ChainStep) -> Result<Option<Motion>> {
        let robot = self.robot;
        let parameter = match robot.joint(step.joint).dof() {
            Some(p) => p,
            None => return Ok(None),
        };
        let values = self.step_values(step.joint)?;
        let k = robot.convention().position(parameter);
        let (variable_step, _) = values[k];
        let (prefix, sign) = match step.direction {
            Direction::Forward => {
                let before = values[..k]
                    .iter()
                    .map(|(s, v)| self.elementary(*s, *v))
                    .collect::<Vec<_>>();
                (self.product_of(before), 1.0)
            }
            Direction::Backward => {
                // inverse steps are applied from the last one
                let before = values[k + 1..]
                    .iter()
                    .rev()
                    .map(|(s, v)| {
                        let minus_v = self.arena.neg(*v);
                        self.elementary(*s, minus_v)
                    })
                    .collect::<Vec<_>>();
                (self.product_of(before), -1.0)
            }
        };
        Ok(Some(Motion {
            prefix,
            axis: variable_step.axis(),
            sign,
            rotational: variable_step.is_rotation(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_elementary_rotation() {
        let robot = Robot::from_dh_rows("r", Convention::standard(), vec![]).unwrap();
        let mut builder = TransformBuilder::new(&robot);
        let angle = builder.arena_mut().constant(FRAC_PI_2);
        let rz = builder.elementary(Step::rot_z(DhParameter::Angle), angle);
        let values = HashMap::new();
        let rz = builder.arena().eval_matrix(&rz, &values).unwrap();
        // x axis goes to y
        assert_eq!(rz[(0, 0)], 0.0);
        assert_eq!(rz[(1, 0)], 1.0);
        assert_eq!(rz[(0, 1)], -1.0);
    }

    #[test]
    fn test_backward_motion_sign() {
        let robot = Robot::from_dh_rows(
            "r",
            Convention::standard(),
            vec![DhRow::new("j", DhParameters::new(0.1, DhValue::Variable, 0.2, 0.3))],
        )
        .unwrap();
        let joint = robot.find_joint("j").unwrap();
        let mut builder = TransformBuilder::new(&robot);
        let forward = builder
            .motion(ChainStep {
                joint,
                direction: Direction::Forward,
            })
            .unwrap()
            .unwrap();
        assert_eq!(forward.sign, 1.0);
        assert_eq!(forward.axis, Axis::Z);
        assert!(forward.rotational);
        let backward = builder
            .motion(ChainStep {
                joint,
                direction: Direction::Backward,
            })
            .unwrap()
            .unwrap();
        assert_eq!(backward.sign, -1.0);
    }

    #[test]
    fn test_fixed_has_no_motion() {
        let robot = Robot::from_dh_rows(
            "r",
            Convention::standard(),
            vec![DhRow::new("j", DhParameters::new(0.1, 0.0, 0.2, 0.3))],
        )
        .unwrap();
        let joint = robot.find_joint("j").unwrap();
        let mut builder = TransformBuilder::new(&robot);
        let step = ChainStep {
            joint,
            direction: Direction::Forward,
        };
        assert!(builder.motion(step).unwrap().is_none());
    }
}

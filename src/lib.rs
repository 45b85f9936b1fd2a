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
//! # Symbolic kinematics and code generation using [nalgebra](http://nalgebra.org).
//!
//! `symkin` has below functionalities
//!
//! 1. Symbolic transforms of DH joints, in both directions
//! 1. Symbolic forward kinematics and geometric Jacobians between any two links
//! 1. Symbolic center of mass and its Jacobian
//! 1. Code generation for Python, Julia and MATLAB, sharing common subexpressions
//!
//! See `RobotBuilder` to describe a robot and `Generator` as the top level interface.
//!
//! ```
//! use symkin::*;
//! use std::f64::consts::FRAC_PI_2;
//!
//! let robot = Robot::from_dh_rows(
//!     "arm",
//!     Convention::standard(),
//!     vec![
//!         DhRow::new("j1", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
//!         DhRow::new("j2", DhParameters::new(0.0, DhValue::Variable, 0.0, FRAC_PI_2)),
//!         DhRow::new("j3", DhParameters::new(0.0, DhValue::Variable, 0.4, -FRAC_PI_2)),
//!     ],
//! )
//! .unwrap();
//! let requests = vec![
//!     Request::forward_kinematics("base", "link_3"),
//!     Request::jacobian("base", "link_3"),
//! ];
//! let generated = Generator::new(Language::Julia).generate(&robot, &requests).unwrap();
//! assert_eq!(generated.functions, vec!["fk_base_link_3", "jacobian_base_link_3"]);
//! ```
mod chain;
mod emit;
mod errors;
mod funcs;
mod function;
mod generator;
pub mod iterator;
pub mod joint;
mod language;
pub mod link;
mod optimize;
mod request;
mod robot;
pub mod symbolic;
mod transform;

pub use self::chain::*;
pub use self::emit::*;
pub use self::errors::*;
pub use self::funcs::*;
pub use self::function::*;
pub use self::generator::*;
pub use self::joint::{Convention, DhParameter, DhParameters, DhValue, Joint, JointBuilder, JointType};
pub use self::language::*;
pub use self::link::{Link, LinkBuilder};
pub use self::optimize::*;
pub use self::request::*;
pub use self::robot::*;
pub use self::transform::*;

// re-export from nalgebra
pub use nalgebra::{DMatrix, Vector3};

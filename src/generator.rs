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
use crate::chain::*;
use crate::emit::Emitter;
use crate::errors::*;
use crate::function::*;
use crate::funcs::*;
use crate::language::Language;
use crate::optimize::Optimizer;
use crate::request::*;
use crate::robot::*;
use crate::symbolic::ExprArena;
use crate::transform::TransformBuilder;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings of a `Generator`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub language: Language,
    /// Build the requests on the rayon thread pool
    pub parallel: bool,
    /// Smallest expression weight taken from another function by a call
    pub min_shared_cost: usize,
    /// Write the banner comment and the imports
    pub file_header: bool,
    /// Write section and function titles
    pub section_titles: bool,
    /// Name of the MATLAB class holding the functions, the sanitized robot
    /// name when `None`
    pub class_name: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            parallel: true,
            min_shared_cost: 4,
            file_header: true,
            section_titles: true,
            class_name: None,
        }
    }
}

/// Build `Generator`
///
/// # Examples
///
/// ```
/// use symkin::{GeneratorBuilder, Language};
///
/// let generator = GeneratorBuilder::new()
///     .language(Language::Matlab)
///     .parallel(false)
///     .finalize();
/// assert_eq!(generator.config().language, Language::Matlab);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GeneratorBuilder {
    pub config: GeneratorConfig,
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn language(&mut self, language: Language) -> &mut Self {
        self.config.language = language;
        self
    }
    pub fn parallel(&mut self, parallel: bool) -> &mut Self {
        self.config.parallel = parallel;
        self
    }
    pub fn min_shared_cost(&mut self, cost: usize) -> &mut Self {
        self.config.min_shared_cost = cost;
        self
    }
    pub fn file_header(&mut self, file_header: bool) -> &mut Self {
        self.config.file_header = file_header;
        self
    }
    pub fn section_titles(&mut self, section_titles: bool) -> &mut Self {
        self.config.section_titles = section_titles;
        self
    }
    pub fn class_name(&mut self, name: &str) -> &mut Self {
        self.config.class_name = Some(name.to_owned());
        self
    }
    pub fn finalize(&self) -> Generator {
        Generator::with_config(self.config.clone())
    }
}

/// Request which could not be generated
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Index of the request in the input slice
    pub request: usize,
    pub error: Error,
}

/// Result of a generation
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    /// The whole source file
    pub code: String,
    /// Generated function names, in output order
    pub functions: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Turn requests on a robot into source code
///
/// # Examples
///
/// ```
/// use symkin::*;
///
/// let robot = Robot::from_dh_rows(
///     "arm",
///     Convention::standard(),
///     vec![
///         DhRow::new("j1", DhParameters::new(0.1, DhValue::Variable, 0.3, 0.0)).mass(1.0),
///         DhRow::new("j2", DhParameters::new(0.0, DhValue::Variable, 0.2, 0.0)).mass(0.5),
///     ],
/// )
/// .unwrap();
/// let generated = Generator::new(Language::Python)
///     .generate(&robot, &Request::defaults_for(&robot))
///     .unwrap();
/// assert!(generated.diagnostics.is_empty());
/// assert!(generated.functions.contains(&"jacobian_base_link_2".to_owned()));
/// assert!(generated.code.contains("def com(theta_j1, theta_j2):"));
/// ```
#[derive(Clone)]
pub struct Generator {
    config: GeneratorConfig,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Functions of one request, in their own arena
struct Built {
    arena: ExprArena,
    functions: Vec<RawFunction>,
}

impl Generator {
    pub fn new(language: Language) -> Self {
        Self::with_config(GeneratorConfig {
            language,
            ..Default::default()
        })
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            cancel: None,
            progress: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Stop the generation with `Error::Cancelled` once `flag` is set
    ///
    /// The flag is checked before each request.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Call `callback(done, total)` each time a request is built
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Generate the code of every enabled request
    ///
    /// A request which fails alone is reported in `Generated::diagnostics`
    /// and the others are still generated. `Error::Cancelled` and
    /// `Error::DependencyCycle` stop everything.
    pub fn generate(&self, robot: &Robot, requests: &[Request]) -> Result<Generated> {
        self.check_cancelled()?;
        let total = requests.len();
        let done = AtomicUsize::new(0);
        let build = |(index, request): (usize, &Request)| -> Result<Option<Built>> {
            self.check_cancelled()?;
            let built = if request.enabled {
                debug!(request = index, %request, "building");
                build_request(robot, index, request).map(Some)
            } else {
                Ok(None)
            };
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(progress) = &self.progress {
                progress(finished, total);
            }
            built
        };
        let results: Vec<Result<Option<Built>>> = if self.config.parallel {
            requests.par_iter().enumerate().map(&build).collect()
        } else {
            requests.iter().enumerate().map(&build).collect()
        };

        // merge in request order
        let mut arena = ExprArena::new();
        let mut raw = Vec::new();
        let mut diagnostics = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(None) => {}
                Ok(Some(built)) => {
                    let mut memo = HashMap::new();
                    for mut function in built.functions {
                        function.output = arena.import_matrix(&built.arena, &function.output, &mut memo);
                        raw.push(function);
                    }
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!(request = index, %error, "request dropped");
                    diagnostics.push(Diagnostic {
                        request: index,
                        error,
                    });
                }
            }
        }
        self.check_cancelled()?;

        let mut keys = HashSet::new();
        raw.retain(|f| keys.insert(f.key));
        raw.sort_by_key(|f| (f.key.section(), f.request));
        make_names_unique(&mut raw);
        debug!(functions = raw.len(), nodes = arena.len(), "requests merged");

        let functions = Optimizer::new()
            .min_shared_cost(self.config.min_shared_cost)
            .optimize(&arena, raw);
        let class_name = self
            .config
            .class_name
            .clone()
            .unwrap_or_else(|| sanitize(robot.name()));
        let mut emitter = Emitter::new(self.config.language)
            .section_titles(self.config.section_titles)
            .class_name(&class_name);
        if self.config.file_header {
            emitter = emitter.header(vec![
                format!("Kinematics of the robot {}.", robot.name()),
                format!("Generated by symkin, DH convention {}.", robot.convention()),
            ]);
        }
        let (code, order) = emitter.emit(&arena, &functions)?;
        let names = order
            .iter()
            .map(|i| functions[*i].name().to_owned())
            .collect::<Vec<_>>();
        info!(
            robot = %robot.name(),
            functions = names.len(),
            dropped = diagnostics.len(),
            "generation finished"
        );
        Ok(Generated {
            code,
            functions: names,
            diagnostics,
        })
    }
}

/// Add `_2`, `_3`, ... to names already taken
fn make_names_unique(functions: &mut [RawFunction]) {
    let mut taken = HashSet::new();
    for function in functions {
        if taken.insert(function.name.clone()) {
            continue;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", function.name, n);
            if taken.insert(candidate.clone()) {
                function.name = candidate;
                break;
            }
            n += 1;
        }
    }
}

fn build_request(robot: &Robot, index: usize, request: &Request) -> Result<Built> {
    let mut builder = TransformBuilder::new(robot);
    let mut functions = Vec::new();
    let link_name = move |id: LinkId| robot.link(id).name.as_str();
    let function = move |key: FunctionKey,
                    name: String,
                    description: String,
                    returns: String,
                    built: KinematicMatrix,
                    columns: bool| {
        let parameters = built
            .dofs
            .iter()
            .filter_map(|j| Parameter::of_joint(robot.joint(*j)))
            .collect::<Vec<_>>();
        RawFunction {
            key,
            name,
            request: index,
            description,
            returns,
            columns: if columns {
                parameters.iter().map(|p| p.name.clone()).collect()
            } else {
                vec![]
            },
            parameters,
            output: built.matrix,
        }
    };
    match request.kind {
        RequestKind::Transform => {
            let chain = robot.resolve_chain(&request.origin, &request.destination)?;
            let joint_id = match chain.steps() {
                [step] if step.direction == Direction::Forward => step.joint,
                _ => {
                    return Err(Error::UnresolvableChain {
                        origin: request.origin.clone(),
                        destination: request.destination.clone(),
                        reason: "a transform needs the parent and the child link of one joint"
                            .to_owned(),
                    })
                }
            };
            let joint = robot.joint(joint_id);
            let parent = link_name(joint.parent());
            let child = link_name(joint.child());
            let kind = joint.joint_type.name();
            for (enabled, direction) in [
                (request.directions.forward, Direction::Forward),
                (request.directions.backward, Direction::Backward),
            ] {
                if !enabled {
                    continue;
                }
                let step = ChainStep {
                    joint: joint_id,
                    direction,
                };
                let built = joint_transform(&mut builder, step)?;
                let (from, to, suffix) = match direction {
                    Direction::Forward => (parent, child, ""),
                    Direction::Backward => (child, parent, "_inv"),
                };
                functions.push(function(
                    FunctionKey::Transform {
                        joint: joint_id,
                        direction,
                    },
                    format!("T_{}{}", sanitize(&joint.name), suffix),
                    format!(
                        "Transition matrix to go from link {from} to link {to} through the {kind} joint {}.",
                        joint.name
                    ),
                    format!("4x4 homogeneous transform of the {to} frame in the {from} frame."),
                    built,
                    false,
                ));
            }
        }
        RequestKind::ForwardKinematics | RequestKind::Jacobian => {
            let chain = robot.resolve_chain(&request.origin, &request.destination)?;
            let origin = link_name(chain.origin());
            let destination = link_name(chain.destination());
            if request.kind == RequestKind::ForwardKinematics {
                let built = forward_kinematics(&mut builder, &chain)?;
                functions.push(function(
                    FunctionKey::ForwardKinematics {
                        origin: chain.origin(),
                        destination: chain.destination(),
                    },
                    format!("fk_{}_{}", sanitize(origin), sanitize(destination)),
                    format!("Computes the forward kinematics from the link {origin} to the link {destination}."),
                    format!(
                        "4x4 homogeneous transform giving the position and the orientation of {destination} in the {origin} frame."
                    ),
                    built,
                    false,
                ));
            } else {
                let built = jacobian(&mut builder, &chain)?;
                let n = built.matrix.ncols();
                functions.push(function(
                    FunctionKey::Jacobian {
                        origin: chain.origin(),
                        destination: chain.destination(),
                    },
                    format!("jacobian_{}_{}", sanitize(origin), sanitize(destination)),
                    format!(
                        "Computes the geometric Jacobian of the link {destination} relative to the link {origin}, expressed in the {origin} frame."
                    ),
                    format!(
                        "6x{n} matrix. Rows are the linear velocity (x, y, z) then the angular velocity (x, y, z) of {destination}, one column per degree of freedom."
                    ),
                    built,
                    true,
                ));
            }
        }
        RequestKind::CenterOfMass => {
            let built = center_of_mass(&mut builder)?;
            let root = link_name(robot.root());
            functions.push(function(
                FunctionKey::CenterOfMass,
                "com".to_owned(),
                format!(
                    "Computes the center of mass of the robot {}, expressed in the frame of its root link {root}.",
                    robot.name()
                ),
                "3x1 position of the center of mass.".to_owned(),
                built,
                false,
            ));
        }
        RequestKind::CenterOfMassJacobian => {
            let built = center_of_mass_jacobian(&mut builder)?;
            let root = link_name(robot.root());
            let n = built.matrix.ncols();
            functions.push(function(
                FunctionKey::CenterOfMassJacobian,
                "jacobian_com".to_owned(),
                format!(
                    "Computes the Jacobian of the center of mass of the robot {}, expressed in the frame of its root link {root}.",
                    robot.name()
                ),
                format!("3x{n} matrix mapping the joint velocities to the velocity of the center of mass."),
                built,
                true,
            ));
        }
    }
    Ok(Built {
        arena: builder.into_arena(),
        functions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::*;

    fn raw(name: &str) -> RawFunction {
        RawFunction {
            key: FunctionKey::CenterOfMass,
            name: name.to_owned(),
            request: 0,
            description: String::new(),
            returns: String::new(),
            parameters: vec![],
            columns: vec![],
            output: ExprArena::new().identity(1),
        }
    }

    #[test]
    fn test_unique_names() {
        let mut functions = vec![raw("a"), raw("a"), raw("a_2"), raw("b")];
        make_names_unique(&mut functions);
        let names = functions.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "a_2", "a_2_2", "b"]);
    }

    #[test]
    fn test_transform_needs_one_joint() {
        let robot = Robot::from_dh_rows(
            "r",
            Convention::standard(),
            vec![
                DhRow::new("j1", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
                DhRow::new("j2", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
            ],
        )
        .unwrap();
        assert!(build_request(&robot, 0, &Request::transform("base", "link_1")).is_ok());
        assert!(matches!(
            build_request(&robot, 0, &Request::transform("base", "link_2")),
            Err(Error::UnresolvableChain { .. })
        ));
        assert!(build_request(&robot, 0, &Request::transform("link_1", "base")).is_err());
    }
}

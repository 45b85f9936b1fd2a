use std::f64::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use symkin::joint::Limits;
use symkin::*;

fn arm() -> Robot {
    Robot::from_dh_rows(
        "arm",
        Convention::standard(),
        vec![
            DhRow::new("j1", DhParameters::new(0.3, DhValue::Variable, 0.0, FRAC_PI_2))
                .mass(2.0)
                .limits(Limits {
                    position: Some((-3.0..=3.0).into()),
                    velocity: Some(1.5),
                    acceleration: None,
                }),
            DhRow::new("j2", DhParameters::new(0.0, DhValue::Variable, 0.4, 0.0))
                .mass(1.0)
                .com(Vector3::new(-0.2, 0.0, 0.0)),
            DhRow::new("j3", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0))
                .mass(0.5)
                .com(Vector3::new(-0.15, 0.0, 0.0)),
            DhRow::new("slide", DhParameters::new(DhValue::Variable, 0.0, 0.0, 0.0)).mass(0.1),
        ],
    )
    .unwrap()
}

fn generate(language: Language, requests: &[Request]) -> Generated {
    Generator::new(language).generate(&arm(), requests).unwrap()
}

#[test]
fn test_default_requests() {
    let robot = arm();
    let generated = Generator::new(Language::Python)
        .generate(&robot, &Request::defaults_for(&robot))
        .unwrap();
    assert!(generated.diagnostics.is_empty());
    for name in [
        "T_j1",
        "T_j1_inv",
        "T_slide",
        "T_slide_inv",
        "fk_base_link_4",
        "jacobian_base_link_4",
        "com",
        "jacobian_com",
    ] {
        assert!(
            generated.functions.iter().any(|f| f == name),
            "{name} missing from {:?}",
            generated.functions
        );
    }
    // definitions follow the function order
    let positions = generated
        .functions
        .iter()
        .map(|name| generated.code.find(&format!("def {name}(")).unwrap())
        .collect::<Vec<_>>();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_deterministic() {
    let robot = arm();
    let requests = Request::defaults_for(&robot);
    for language in [Language::Python, Language::Julia, Language::Matlab] {
        let parallel = Generator::new(language).generate(&robot, &requests).unwrap();
        let again = Generator::new(language).generate(&robot, &requests).unwrap();
        let sequential = GeneratorBuilder::new()
            .language(language)
            .parallel(false)
            .finalize()
            .generate(&robot, &requests)
            .unwrap();
        assert_eq!(parallel.code, again.code);
        assert_eq!(parallel.code, sequential.code);
        assert_eq!(parallel.functions, sequential.functions);
    }
}

#[test]
fn test_python() {
    let generated = generate(Language::Python, &[Request::forward_kinematics("base", "link_2")]);
    let code = &generated.code;
    assert!(code.starts_with("# Kinematics of the robot arm.\n"));
    assert!(code.contains("from math import cos, sin\nfrom numpy import array, zeros\n"));
    assert!(code.contains("def fk_base_link_2(theta_j1, theta_j2):\n    \"\"\"\n"));
    assert!(code.contains("FORWARD KINEMATICS"));
    assert!(code.contains("    return array([["));
    assert!(code.contains("theta_j1 : float"));
    assert!(code.contains("Position limits:"));
    assert!(code.contains("Velocity limit: 1.5."));
    assert!(code.ends_with("]])\n"));
}

#[test]
fn test_julia() {
    let generated = generate(Language::Julia, &[Request::forward_kinematics("base", "link_2")]);
    let code = &generated.code;
    assert!(code.starts_with("# Kinematics of the robot arm."));
    assert!(!code.contains("import"));
    let doc = code.find("    fk_base_link_2(theta_j1, theta_j2)").unwrap();
    let signature = code.find("function fk_base_link_2(theta_j1, theta_j2)").unwrap();
    assert!(doc < signature);
    assert!(code.contains("theta_j1 : Float64"));
    assert!(code.contains("    return ["));
    assert!(code.ends_with("end\n"));
}

#[test]
fn test_matlab() {
    let generated = generate(Language::Matlab, &[Request::jacobian("base", "link_2")]);
    let code = &generated.code;
    assert!(code.starts_with("% Kinematics of the robot arm."));
    let signature = code
        .find("function out = jacobian_base_link_2(theta_j1, theta_j2)")
        .unwrap();
    let doc = code.find("% Computes the geometric Jacobian").unwrap();
    assert!(signature < doc);
    assert!(code.contains("%     Column 1: theta_j1"));
    assert!(code.contains("%     Column 2: theta_j2"));
    assert!(code.contains("    out = ["));
    let class = code.find("classdef arm\nmethods (Static)\n").unwrap();
    assert!(class < signature);
    assert!(code.ends_with("end\n\nend\nend\n"));
}

#[test]
fn test_matlab_class() {
    let robot = Robot::from_dh_rows(
        "single",
        Convention::standard(),
        vec![DhRow::new("j1", DhParameters::new(0.2, DhValue::Variable, 0.5, 0.0))],
    )
    .unwrap();
    let requests = [
        Request::forward_kinematics("base", "link_1"),
        Request::transform("base", "link_1").forward_only(),
    ];
    let generated = Generator::new(Language::Matlab)
        .generate(&robot, &requests)
        .unwrap();
    assert!(generated.code.contains("classdef single\nmethods (Static)\n"));
    assert!(generated.code.contains("    out = single.T_j1(theta_j1);\n"));

    let generated = GeneratorBuilder::new()
        .language(Language::Matlab)
        .class_name("SingleKinematics")
        .finalize()
        .generate(&robot, &requests)
        .unwrap();
    assert!(generated.code.contains("classdef SingleKinematics\n"));
    assert!(generated.code.contains("    out = SingleKinematics.T_j1(theta_j1);\n"));
    // the class name does not leak into the other languages
    let generated = GeneratorBuilder::new()
        .language(Language::Julia)
        .class_name("SingleKinematics")
        .finalize()
        .generate(&robot, &requests)
        .unwrap();
    assert!(!generated.code.contains("SingleKinematics"));
    assert!(generated.code.contains("    return T_j1(theta_j1)\n"));
}

#[test]
fn test_julia_column_is_a_matrix() {
    let generated = generate(Language::Julia, &[Request::center_of_mass()]);
    assert!(generated.code.contains("    return reshape(["));
    assert!(generated.code.contains("], 3, 1)\n"));
}

#[test]
fn test_unsupported_language() {
    assert_eq!(
        "cobol".parse::<Language>(),
        Err(Error::UnsupportedLanguage {
            name: "cobol".to_owned()
        })
    );
    assert_eq!("MATLAB".parse::<Language>(), Ok(Language::Matlab));
    assert_eq!("py".parse::<Language>(), Ok(Language::Python));
}

#[test]
fn test_diagnostics() {
    let requests = [
        Request::forward_kinematics("base", "hand"),
        Request::forward_kinematics("base", "link_1"),
        Request::transform("base", "link_2"),
    ];
    let generated = generate(Language::Python, &requests);
    assert_eq!(generated.functions, vec!["fk_base_link_1"]);
    let failed = generated
        .diagnostics
        .iter()
        .map(|d| d.request)
        .collect::<Vec<_>>();
    assert_eq!(failed, vec![0, 2]);
    assert!(matches!(
        generated.diagnostics[0].error,
        Error::UnresolvableChain { .. }
    ));
}

#[test]
fn test_zero_mass() {
    let robot = Robot::from_dh_rows(
        "ghost",
        Convention::standard(),
        vec![DhRow::new("j", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0))],
    )
    .unwrap();
    let generated = Generator::new(Language::Julia)
        .generate(&robot, &Request::defaults_for(&robot))
        .unwrap();
    assert!(!generated.functions.iter().any(|f| f == "com"));
    assert!(!generated.functions.iter().any(|f| f == "jacobian_com"));
    assert!(!generated.code.contains("CENTER OF MASS"));
    assert_eq!(generated.diagnostics.len(), 2);
    for diagnostic in &generated.diagnostics {
        assert_eq!(
            diagnostic.error,
            Error::UndefinedCenterOfMass {
                robot_name: "ghost".to_owned()
            }
        );
    }
}

#[test]
fn test_invalid_joint_name() {
    let robot = Robot::from_dh_rows(
        "dashes",
        Convention::standard(),
        vec![
            DhRow::new("elbow-1", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
            DhRow::new("wrist", DhParameters::new(0.0, DhValue::Variable, 0.3, 0.0)),
        ],
    )
    .unwrap();
    let requests = [
        Request::forward_kinematics("base", "link_2"),
        Request::transform("link_1", "link_2"),
    ];
    let generated = Generator::new(Language::Python)
        .generate(&robot, &requests)
        .unwrap();
    assert_eq!(generated.functions, vec!["T_wrist", "T_wrist_inv"]);
    assert_eq!(generated.diagnostics.len(), 1);
    assert_eq!(
        generated.diagnostics[0].error,
        Error::InvalidDegreeOfFreedomName {
            joint_name: "elbow-1".to_owned(),
            identifier: "theta_elbow-1".to_owned(),
        }
    );
}

#[test]
fn test_duplicates_and_disabled() {
    let requests = [
        Request::forward_kinematics("base", "link_3"),
        Request::jacobian("base", "link_3").disabled(),
        Request::forward_kinematics("base", "link_3"),
        Request::transform("link_1", "link_2").backward_only(),
    ];
    let generated = generate(Language::Python, &requests);
    assert_eq!(generated.functions, vec!["T_j2_inv", "fk_base_link_3"]);
    assert_eq!(generated.code.matches("def fk_base_link_3(").count(), 1);
    assert!(generated.diagnostics.is_empty());
}

#[test]
fn test_alias() {
    let robot = Robot::from_dh_rows(
        "single",
        Convention::standard(),
        vec![DhRow::new("j1", DhParameters::new(0.2, DhValue::Variable, 0.5, 0.0))],
    )
    .unwrap();
    let requests = [
        Request::forward_kinematics("base", "link_1"),
        Request::transform("base", "link_1").forward_only(),
    ];
    let generated = Generator::new(Language::Python)
        .generate(&robot, &requests)
        .unwrap();
    // transforms are written first, the forward kinematics only calls it
    assert_eq!(generated.functions, vec!["T_j1", "fk_base_link_1"]);
    assert!(generated.code.contains("    return T_j1(theta_j1)\n"));
}

#[test]
fn test_calls_between_functions() {
    let robot = arm();
    let requests = Request::defaults_for(&robot);
    for min_shared_cost in [1, 4] {
        let generated = GeneratorBuilder::new()
            .language(Language::Python)
            .min_shared_cost(min_shared_cost)
            .finalize()
            .generate(&robot, &requests)
            .unwrap();
        // every called function is defined before its caller
        for (i, name) in generated.functions.iter().enumerate() {
            let start = generated.code.find(&format!("def {name}(")).unwrap();
            let end = generated
                .functions
                .get(i + 1)
                .map(|next| generated.code.find(&format!("def {next}(")).unwrap())
                .unwrap_or(generated.code.len());
            for line in generated.code[start..end].lines() {
                let Some(call) = line.trim().strip_prefix("res").and_then(|l| l.split_once(" = ")) else {
                    continue;
                };
                let callee = call.1.split('(').next().unwrap();
                let position = generated.functions.iter().position(|f| f == callee).unwrap();
                assert!(position < i, "{name} calls {callee} defined after it");
            }
        }
    }
}

#[test]
fn test_without_header_and_titles() {
    let generated = GeneratorBuilder::new()
        .language(Language::Python)
        .file_header(false)
        .section_titles(false)
        .finalize()
        .generate(&arm(), &[Request::center_of_mass()])
        .unwrap();
    assert!(generated.code.starts_with("def com(theta_j1, theta_j2, theta_j3, d_slide):"));
    assert!(!generated.code.contains("import"));
}

#[test]
fn test_cancel() {
    let robot = arm();
    let flag = Arc::new(AtomicBool::new(true));
    let result = Generator::new(Language::Python)
        .cancel_flag(flag.clone())
        .generate(&robot, &Request::defaults_for(&robot));
    assert_eq!(result, Err(Error::Cancelled));

    flag.store(false, Ordering::SeqCst);
    let result = Generator::new(Language::Python)
        .cancel_flag(flag)
        .generate(&robot, &Request::defaults_for(&robot));
    assert!(result.is_ok());
}

#[test]
fn test_progress() {
    let robot = arm();
    let requests = Request::defaults_for(&robot);
    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(Vec::new()));
    let generator = {
        let calls = calls.clone();
        let last = last.clone();
        Generator::new(Language::Julia).on_progress(move |done, total| {
            calls.fetch_add(1, Ordering::SeqCst);
            last.lock().unwrap().push((done, total));
        })
    };
    generator.generate(&robot, &requests).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), requests.len());
    let mut seen = last.lock().unwrap().clone();
    seen.sort();
    let expected = (1..=requests.len())
        .map(|i| (i, requests.len()))
        .collect::<Vec<_>>();
    assert_eq!(seen, expected);
}

//! Deterministic Stommel runs through the adaptive stepper.

use std::path::PathBuf;

use ta_core::Vector;
use ta_models::{Stommel, StommelParams};
use ta_sim::{Model, RunStatus, ThetaModel, ThetaParams, ThetaStepper};

fn output_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ta_models_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn params(dir: PathBuf) -> ThetaParams {
    ThetaParams {
        end_time_years: 1.0e6,
        max_steps: 200,
        output_frequency: 50,
        output_dir: dir,
        ..ThetaParams::default()
    }
}

#[test]
fn run_settles_on_thermal_state() {
    let dir = output_dir("thermal");
    let stommel = Stommel::new(StommelParams::default()).unwrap();
    let (thermal, _, _) = stommel.transition_states().unwrap();

    let mut model = ThetaModel::deterministic(stommel, &params(dir.clone())).unwrap();
    let summary = ThetaStepper::new(&mut model, &params(dir.clone()))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.steps, 200);
    assert_eq!(summary.rejected_steps, 0);
    assert_eq!(summary.dt, 1.0);
    assert!((model.state() - &thermal).amax() < 1e-6);
    assert_eq!(model.physics().accepted_steps(), 200);

    let tdata = std::fs::read_to_string(dir.join("tdata.txt")).unwrap();
    let mut lines = tdata.lines();
    assert!(lines.next().unwrap().trim_end().ends_with("psi"));
    assert_eq!(lines.count(), 200);

    let snapshots: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("transient_") && n.ends_with(".h5"))
        .collect();
    assert_eq!(snapshots.len(), 4);

    let text = std::fs::read_to_string(dir.join(&snapshots[0])).unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(snapshot["temperature"].is_f64());
    assert_eq!(snapshot["params"]["thermal forcing"], 3.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn salinity_state_is_also_stable() {
    let dir = output_dir("salinity");
    let stommel = Stommel::new(StommelParams::default()).unwrap();
    let (_, _, salinity) = stommel.transition_states().unwrap();
    let start = &salinity + Vector::from_vec(vec![0.0, 0.01]);

    let stommel = Stommel::new(StommelParams {
        t0: start[0],
        s0: start[1],
        ..StommelParams::default()
    })
    .unwrap();
    let mut model = ThetaModel::deterministic(stommel, &params(dir.clone())).unwrap();
    let summary = ThetaStepper::new(&mut model, &params(dir.clone()))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert!((model.state() - &salinity).amax() < 1e-6);

    let _ = std::fs::remove_dir_all(&dir);
}

use std::sync::Arc;

use ndarray::{arr1, arr2, Array2};
use nn_regularizers::prelude::*;
use nn_regularizers::TensorError;
use serde_json::json;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn zero_factors_never_penalize() {
    let reg = L1L2::new(0.0, 0.0);
    for x in [arr1(&[0.0]), arr1(&[1.0, -2.0, 3.0]), arr1(&[1e6, -1e6])] {
        assert_eq!(reg.penalty(x.into_dyn().view()).unwrap(), 0.0);
    }
}

#[test]
fn l1_and_l2_match_their_norms() {
    let x = arr2(&[[1.0, -2.0], [3.0, -4.0]]).into_dyn();
    assert!(close(L1L2::new(0.5, 0.0).penalty(x.view()).unwrap(), 0.5 * 10.0));
    assert!(close(L1L2::new(0.0, 0.5).penalty(x.view()).unwrap(), 0.5 * 30.0));
}

#[test]
fn config_round_trip_preserves_factors() {
    let config = L1L2::new(0.3, 0.7).config();
    let rebuilt = L1L2::from_config(&config).unwrap().config();
    assert_eq!(rebuilt, config);
    assert_eq!(rebuilt["l1"].as_f64().map(|v| v as f32), Some(0.3));
    assert_eq!(rebuilt["l2"].as_f64().map(|v| v as f32), Some(0.7));
}

#[test]
fn get_resolves_every_identifier_kind() {
    assert!(get(serde_json::Value::Null).unwrap().is_none());

    let by_name = get("l2").unwrap().unwrap();
    assert_eq!(serialize(&by_name), serialize(&L1L2::new(0.0, 0.01)));

    let x = arr1(&[1.0, -2.0, 3.0]).into_dyn();
    let by_entry = get(json!({"class_name": "L1L2", "config": {"l1": 0.1, "l2": 0.2}}))
        .unwrap()
        .unwrap();
    assert!(close(by_entry.penalty(x.view()).unwrap(), 3.4));

    let ready: Arc<dyn Regularizer> = Arc::new(l1(0.5_f32));
    assert!(Arc::ptr_eq(&get(Arc::clone(&ready)).unwrap().unwrap(), &ready));

    assert!(matches!(get(json!(42)), Err(RegularizerError::InvalidIdentifier(_))));
}

#[test]
fn class_average_penalty_by_hand() {
    let reg = ClassAverageRegularizer::new(2.0, arr2(&[[1.0, 0.0], [0.0, 1.0]]));
    let w = arr2(&[[1.0, -1.0], [2.0, 3.0]]).into_dyn();
    // W² = [[1, 1], [4, 9]]; (W²)ᵀ @ I has diagonal [1, 9]
    assert_eq!(reg.penalty(w.view()).unwrap(), 2.0 * 10.0);
}

#[test]
fn class_average_rejects_misaligned_weights() {
    let reg = ClassAverageRegularizer::new(1.0, Array2::eye(4));
    let w = Array2::<f32>::ones((3, 4)).into_dyn();
    assert!(matches!(
        reg.penalty(w.view()),
        Err(RegularizerError::Tensor(TensorError::ShapeMismatch { .. }))
    ));
}

#[test]
fn serialized_entries_rebuild_equivalent_regularizers() {
    let originals: Vec<Arc<dyn Regularizer>> = vec![
        Arc::new(NoRegularizer),
        Arc::new(l1_l2(0.25_f32, 0.5_f32)),
        Arc::new(ClassAverageRegularizer::new(0.5, arr2(&[[1.0, 2.0], [3.0, 4.0]]))),
    ];
    let w = arr2(&[[1.0, 2.0], [-1.0, 0.5]]).into_dyn();

    for original in originals {
        let text = serde_json::to_string(&serialize(&original)).unwrap();
        let entry: RegistryEntry = serde_json::from_str(&text).unwrap();
        let rebuilt = deserialize(&entry, &Registry::new()).unwrap();

        assert_eq!(rebuilt.class_name(), original.class_name());
        assert_eq!(
            rebuilt.penalty(w.view()).unwrap(),
            original.penalty(w.view()).unwrap()
        );
    }
}

#[test]
fn unknown_keys_fail_construction() {
    let entry: RegistryEntry = serde_json::from_value(json!({
        "class_name": "L1L2",
        "config": {"l1": 0.1, "decay": 0.9}
    }))
    .unwrap();
    match deserialize(&entry, &Registry::new()) {
        Err(RegularizerError::InvalidConfig { class_name, source }) => {
            assert_eq!(class_name, "L1L2");
            assert!(source.to_string().contains("decay"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

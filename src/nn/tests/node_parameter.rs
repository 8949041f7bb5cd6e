use std::fs;

use crate::assert_err;
use crate::nn::{Init, NodeError, Parameter, ShapeSpec};

fn uniform(seed: u64) -> Init {
    Init::Uniform {
        seed: Some(seed),
        scale: 1.0,
        cpu_only: false,
    }
}

#[test]
fn test_construction_with_known_shape_materializes_immediately() {
    // 显式给全维度 + 可延迟计划：构造时当场实体化
    let node = Parameter::new(&[2, 3], Init::Constant(2.5), "w").unwrap();
    assert!(!node.has_pending_init());
    assert_eq!(node.shape().dims(), &[2, 3]);
    assert!(node.value().data_as_slice().iter().all(|&x| x == 2.5));
    assert_eq!(node.learning_rate_multiplier(), 1.0);
}

#[test]
fn test_construction_with_unknown_shape_stays_pending() {
    let node = Parameter::new(&[0, 10], uniform(1), "w").unwrap();
    assert!(node.has_pending_init());
    assert!(!node.shape().is_fully_known());
    assert_eq!(node.value().size(), 0); // 缓冲区只是空占位
}

#[test]
fn test_zero_init_is_constant_zero() {
    let node = Parameter::new(&[3, 3], Init::Zero, "w").unwrap();
    assert!(!node.has_pending_init());
    assert!(node.value().data_as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn test_infer_then_materialize() {
    // 形状 [0, 10] + 均匀计划，由 [5, 10] 推断后：形状 [5, 10]，
    // 缓冲区 50 个元素，取值落在 [-0.05*scale, 0.05*scale]
    let mut node = Parameter::new(&[0, 10], uniform(42), "w").unwrap();

    node.infer_dimensions_from(&ShapeSpec::new(&[5, 10])).unwrap();

    assert_eq!(node.shape().dims(), &[5, 10]);
    assert!(!node.has_pending_init());
    assert_eq!(node.value().size(), 50);
    assert!(
        node.value()
            .data_as_slice()
            .iter()
            .all(|&x| (-0.05..=0.05).contains(&x))
    );
}

#[test]
fn test_try_materialize_is_idempotent() {
    let mut node = Parameter::new(&[0, 10], uniform(3), "w").unwrap();
    node.infer_dimensions_from(&ShapeSpec::new(&[5, 10])).unwrap();

    // 第二次调用应是无操作：计划保持已清除，缓冲区逐位不变
    let snapshot = node.value().clone();
    node.try_materialize();
    assert!(!node.has_pending_init());
    assert_eq!(node.value(), &snapshot);
}

#[test]
fn test_explicit_shape_takes_precedence() {
    // 显式给全维度的节点：任何推断来源都不会改变其形状
    let mut node = Parameter::new(&[4, 4], uniform(9), "w").unwrap();
    let before = node.value().clone();

    node.infer_dimensions_from(&ShapeSpec::new(&[9, 9])).unwrap();
    assert_eq!(node.shape().dims(), &[4, 4]);
    assert_eq!(node.value(), &before);
}

#[test]
fn test_infer_declines_on_rank_mismatch() {
    // 秩不一致时静默放弃：不报错、不改形状、计划保持挂起，
    // 图验证可在后续轮次从其他邻居重试
    let mut node = Parameter::new(&[0, 10], uniform(2), "w").unwrap();

    node.infer_dimensions_from(&ShapeSpec::new(&[5, 10, 2])).unwrap();
    assert_eq!(node.shape().dims(), &[0, 10]);
    assert!(node.has_pending_init());

    // 换一个秩一致的来源即成功
    node.infer_dimensions_from(&ShapeSpec::new(&[5, 10])).unwrap();
    assert_eq!(node.shape().dims(), &[5, 10]);
    assert!(!node.has_pending_init());
}

#[test]
fn test_infer_ignores_incomplete_source() {
    // 对方形状含未知轴或为空时没有推断价值，无操作
    let mut node = Parameter::new(&[0, 10], uniform(2), "w").unwrap();

    node.infer_dimensions_from(&ShapeSpec::new(&[])).unwrap();
    node.infer_dimensions_from(&ShapeSpec::new(&[0, 10])).unwrap();
    assert_eq!(node.shape().dims(), &[0, 10]);
    assert!(node.has_pending_init());
}

#[test]
fn test_infer_adopts_source_wholesale_when_no_axis_set() {
    // 一个轴都未配置时整体采纳对方形状，秩可以不同
    let mut node = Parameter::new(&[0, 0], uniform(4), "w").unwrap();

    node.infer_dimensions_from(&ShapeSpec::new(&[2, 3, 4])).unwrap();
    assert_eq!(node.shape().dims(), &[2, 3, 4]);
    assert!(!node.has_pending_init());
    assert_eq!(node.value().size(), 24);
}

#[test]
fn test_post_init_replaces_pending_plan() {
    // 1. 重设计划整体替换旧计划（不存在合并），形状齐备后按新计划实体化
    let mut node = Parameter::new(&[0, 4], uniform(6), "w").unwrap();
    node.post_init(&Init::Constant(1.5)).unwrap();
    assert!(node.has_pending_init());

    node.infer_dimensions_from(&ShapeSpec::new(&[2, 4])).unwrap();
    assert!(node.value().data_as_slice().iter().all(|&x| x == 1.5));

    // 2. 已实体化的节点也可以重设计划：立即按新计划重新初始化
    node.post_init(&Init::Zero).unwrap();
    assert!(!node.has_pending_init());
    assert!(node.value().data_as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn test_post_init_rejects_immediate_kinds() {
    let mut node = Parameter::new(&[2, 2], Init::Zero, "w").unwrap();
    let result = node.post_init(&Init::FromLiteral("1 2; 3 4".to_string()));
    assert_err!(
        result,
        NodeError::InvalidOperation(msg) if msg.contains("post_init")
    );
}

#[test]
fn test_from_literal_infers_shape() {
    // 1. [0, 0] 载入 3x4 字面量 → [3, 4]
    let literal = "1 2 3 4; 5 6 7 8; 9 10 11 12";
    let node = Parameter::new(&[0, 0], Init::FromLiteral(literal.to_string()), "w").unwrap();
    assert_eq!(node.shape().dims(), &[3, 4]);
    assert!(!node.has_pending_init());
    assert_eq!(node.value().data_as_slice()[4], 5.0);

    // 2. [0, 5] 载入同一字面量：12 不能被 5 整除，维度推断失败
    let result = Parameter::new(&[0, 5], Init::FromLiteral(literal.to_string()), "w2");
    assert_err!(result, NodeError::DimensionInference { .. });

    // 3. 单列字面量保持一维
    let column = Parameter::new(&[0], Init::FromLiteral("7; 8; 9".to_string()), "w3").unwrap();
    assert_eq!(column.shape().dims(), &[3]);
}

#[test]
fn test_from_literal_rejects_empty() {
    let result = Parameter::new(&[0, 0], Init::FromLiteral("  ".to_string()), "w");
    assert_err!(result, NodeError::InvalidConfiguration { .. });
}

#[test]
fn test_from_file_infers_shape() {
    let temp_file = "test_param_from_file.txt";
    fs::write(temp_file, "1 2 3\n4 5 6\n").unwrap();

    let node = Parameter::new(&[0, 0], Init::FromFile(temp_file.into()), "w").unwrap();
    assert_eq!(node.shape().dims(), &[2, 3]);
    assert!(!node.has_pending_init());
    assert_eq!(node.value().data_as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_from_file_missing_file() {
    let result = Parameter::new(&[0, 0], Init::FromFile("no_such_file.txt".into()), "w");
    assert_err!(result, NodeError::Io(msg) if msg.contains("no_such_file.txt"));
}

#[test]
fn test_revise_from_file_replaces_values_only() {
    let temp_file = "test_param_revise.txt";
    fs::write(temp_file, "9 9\n9 9\n").unwrap();

    // 任何计划状态下 revise 都合法；只替换数值，不碰形状
    let mut node = Parameter::new(&[2, 2], Init::Zero, "w").unwrap();
    node.revise_from_file(temp_file).unwrap();
    assert_eq!(node.shape().dims(), &[2, 2]);
    assert!(node.value().data_as_slice().iter().all(|&x| x == 9.0));

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_revise_from_file_size_mismatch() {
    let temp_file = "test_param_revise_mismatch.txt";
    fs::write(temp_file, "1 2 3\n4 5 6\n").unwrap();

    // 元素数与形状不符：报 DataSizeMismatch，且上下文里带有节点名与文件路径
    let mut node = Parameter::new(&[2, 2], Init::Zero, "w").unwrap();
    let result = node.revise_from_file(temp_file);
    assert_err!(
        result,
        NodeError::DataSizeMismatch { expected, got, context }
            if *expected == 4 && *got == 6
                && context.contains("w") && context.contains(temp_file)
    );

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_revise_from_file_wraps_io_error_with_context() {
    let mut node = Parameter::new(&[2, 2], Init::Zero, "w").unwrap();
    let result = node.revise_from_file("missing_revise_source.txt");
    assert_err!(
        result,
        NodeError::Io(msg) if msg.contains("w") && msg.contains("missing_revise_source.txt")
    );
}

#[test]
fn test_ensure_materialized() {
    // 1. 挂起状态下不可投入计算
    let pending = Parameter::new(&[0, 10], uniform(8), "w").unwrap();
    assert_err!(
        pending.ensure_materialized(),
        NodeError::InvalidOperation(msg) if msg.contains("尚未完成")
    );

    // 2. 实体化之后即就绪
    let ready = Parameter::new(&[2, 2], uniform(8), "w2").unwrap();
    assert!(ready.ensure_materialized().is_ok());
}

#[test]
fn test_freeze_zeroes_multiplier_only() {
    let mut node = Parameter::new(&[2, 2], Init::Constant(3.0), "w").unwrap();
    let before = node.value().clone();

    node.freeze();
    assert_eq!(node.learning_rate_multiplier(), 0.0);
    // 形状与数值不受影响
    assert_eq!(node.shape().dims(), &[2, 2]);
    assert_eq!(node.value(), &before);
}

#[test]
fn test_clone_preserves_pending_plan() {
    // 克隆连同挂起计划一起复制：副本推断维度后能独立完成实体化
    let node = Parameter::new(&[0, 10], uniform(21), "w").unwrap();
    let mut cloned = node.clone();
    assert!(cloned.has_pending_init());

    cloned.infer_dimensions_from(&ShapeSpec::new(&[5, 10])).unwrap();
    assert!(!cloned.has_pending_init());
    assert_eq!(cloned.value().size(), 50);
    // 原节点不受影响
    assert!(node.has_pending_init());
}

#[test]
fn test_display() {
    let mut node = Parameter::new(&[3, 4], Init::Zero, "w").unwrap();
    assert_eq!(
        node.to_string(),
        "节点[name=w, type=Parameter, dims=[3x4], learningRateMultiplier=1, needsGradient=true]"
    );
    node.freeze();
    assert_eq!(
        node.to_string(),
        "节点[name=w, type=Parameter, dims=[3x4], learningRateMultiplier=0, needsGradient=false]"
    );
}

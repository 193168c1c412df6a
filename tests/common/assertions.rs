//! 自定义断言辅助模块
//!
//! 提供测试中的常用断言函数

use distplan::query::planner::PlanGraph;

/// 断言结果成功，返回内部值
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    result.expect("操作应该成功")
}

/// 断言结果失败并匹配错误消息
pub fn assert_err_with<T: std::fmt::Debug, E: std::fmt::Display>(result: Result<T, E>, expected_msg: &str) {
    let err = result.expect_err("操作应该失败");
    let err_str = err.to_string();
    assert!(
        err_str.contains(expected_msg),
        "错误消息应包含 '{}', 实际是 '{}'",
        expected_msg,
        err_str
    );
}

/// 断言 fragment 没有悬空边且每个存活的非 Sink 节点都能到达某个 Sink
pub fn assert_graph_consistent(graph: &PlanGraph) {
    graph.validate().expect("计划图应该一致");
    let sinks = graph.sinks();
    for id in graph.node_ids() {
        let node = graph.get(id).expect("节点应该存在");
        if node.is_sink() {
            continue;
        }
        let reachable = graph
            .transitive_dependents_of(id)
            .expect("节点应该存在");
        assert!(
            sinks.iter().any(|s| reachable.contains(s)),
            "节点 {} ({}) 无法到达任何 Sink",
            id,
            node.name()
        );
    }
}

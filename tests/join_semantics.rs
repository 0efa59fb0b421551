//! Row-level behaviour of the compiled join sub-query, checked by running its
//! JOIN, ON and WHERE clauses over two one-key tables with a nested-loop evaluator.
mod common;
use common::*;
use flowsmith::converters::{JoinKind, NullFilter, Side};
use flowsmith::sql::{BinaryOperator, Expr, JoinOperator, Literal, Query, Select};

/// `(left key, right key)` of one joined row.
type Row = (Option<i32>, Option<i32>);

/// The `joined` sub-query of a join between tables `L(k)` and `R(k)`.
fn joined_select(kind: &str, conditions: &[(&str, &str, &str)]) -> Select {
    let compilation = compile(vec![
        load_csv("1", "L", &[("k", "integer")], vec![next_into("3", "Left")]),
        load_csv("2", "R", &[("k", "integer")], vec![next_into("3", "Right")]),
        join("3", "Join", kind, conditions, vec![]),
    ]);
    let sql = compilation
        .models
        .get("Join_1")
        .and_then(|record| record.sql.clone())
        .expect("Join model should have SQL");
    let cte = sql
        .statement()
        .ctes
        .iter()
        .find(|cte| cte.name == "joined")
        .unwrap_or_else(|| panic!("No joined sub-query for a {} join", kind));
    match &cte.query {
        Query::Select(select) => select.clone(),
        other => panic!("Expected a SELECT, got {:?}", other),
    }
}

fn value(expr: &Expr, row: Row) -> Option<i32> {
    match expr {
        Expr::Column {
            table: Some(table), ..
        } if table == "join_left" => row.0,
        Expr::Column {
            table: Some(table), ..
        } if table == "join_right" => row.1,
        other => panic!("Unexpected operand {:?}", other),
    }
}

fn holds(expr: &Expr, row: Row) -> bool {
    match expr {
        Expr::Literal(Literal::Bool(b)) => *b,
        Expr::Binary { left, op, right } => match (value(left, row), value(right, row)) {
            (Some(l), Some(r)) => match op {
                BinaryOperator::Eq => l == r,
                BinaryOperator::NotEq => l != r,
                BinaryOperator::Gt => l > r,
                BinaryOperator::GtEq => l >= r,
                BinaryOperator::Lt => l < r,
                BinaryOperator::LtEq => l <= r,
            },
            _ => false,
        },
        Expr::IsNull(inner) => value(inner, row).is_none(),
        Expr::And(items) => items.iter().all(|item| holds(item, row)),
        Expr::Or(items) => items.iter().any(|item| holds(item, row)),
        other => panic!("Unexpected predicate {:?}", other),
    }
}

/// Runs the sub-query's FROM, JOIN and WHERE over the two tables.
fn run(select: &Select, left: &[i32], right: &[i32]) -> Vec<Row> {
    let [join] = select.joins.as_slice() else {
        panic!("Expected exactly one join, got {}", select.joins.len());
    };
    let left_drives = select.from.alias.as_deref() == Some("join_left");
    let (driver, other) = if left_drives { (left, right) } else { (right, left) };
    let pair = |d: Option<i32>, o: Option<i32>| if left_drives { (d, o) } else { (o, d) };

    let mut rows = Vec::new();
    let mut other_matched = vec![false; other.len()];
    for d in driver {
        let mut matched = false;
        for (i, o) in other.iter().enumerate() {
            let row = pair(Some(*d), Some(*o));
            if holds(&join.on, row) {
                matched = true;
                other_matched[i] = true;
                rows.push(row);
            }
        }
        if !matched && join.operator != JoinOperator::Inner {
            rows.push(pair(Some(*d), None));
        }
    }
    if join.operator == JoinOperator::FullOuter {
        for (o, _) in other.iter().zip(&other_matched).filter(|(_, seen)| !**seen) {
            rows.push(pair(None, Some(*o)));
        }
    }

    rows.into_iter()
        .filter(|row| select.filter.as_ref().map_or(true, |f| holds(f, *row)))
        .collect()
}

fn evaluate(kind: &str, left: &[i32], right: &[i32]) -> Vec<Row> {
    run(&joined_select(kind, &[("k", "==", "k")]), left, right)
}

const KINDS: [&str; 7] = ["inner", "left", "right", "full", "leftOnly", "rightOnly", "notInner"];
const LEFT: &[i32] = &[1, 2];
const RIGHT: &[i32] = &[2, 3];

#[test]
fn test_inner_keeps_matches() {
    assert_eq!(evaluate("inner", LEFT, RIGHT), vec![(Some(2), Some(2))]);
}

#[test]
fn test_left_and_right_keep_their_side() {
    assert_eq!(
        evaluate("left", LEFT, RIGHT),
        vec![(Some(1), None), (Some(2), Some(2))]
    );
    assert_eq!(
        evaluate("right", LEFT, RIGHT),
        vec![(Some(2), Some(2)), (None, Some(3))]
    );
}

#[test]
fn test_only_kinds_keep_unmatched_rows() {
    assert_eq!(evaluate("leftOnly", LEFT, RIGHT), vec![(Some(1), None)]);
    assert_eq!(evaluate("rightOnly", LEFT, RIGHT), vec![(None, Some(3))]);
}

#[test]
fn test_full_and_not_inner() {
    assert_eq!(evaluate("full", LEFT, RIGHT).len(), 3);
    assert_eq!(
        evaluate("notInner", LEFT, RIGHT),
        vec![(Some(1), None), (None, Some(3))]
    );
}

#[test]
fn test_single_matching_row_per_side() {
    let expected = [1, 1, 1, 1, 0, 0, 0];
    for (kind, rows) in KINDS.iter().zip(expected) {
        assert_eq!(evaluate(kind, &[1], &[1]).len(), rows, "{} join", kind);
    }
    assert_eq!(evaluate("full", &[1], &[1]), vec![(Some(1), Some(1))]);
}

#[test]
fn test_single_unmatched_row_per_side() {
    let expected = [0, 1, 1, 2, 1, 1, 2];
    for (kind, rows) in KINDS.iter().zip(expected) {
        assert_eq!(evaluate(kind, &[1], &[9]).len(), rows, "{} join", kind);
    }
    assert_eq!(evaluate("leftOnly", &[1], &[9]), vec![(Some(1), None)]);
    assert_eq!(evaluate("rightOnly", &[1], &[9]), vec![(None, Some(9))]);
}

#[test]
fn test_join_without_conditions_pairs_every_row() {
    let select = joined_select("inner", &[]);
    assert_eq!(select.joins[0].on, Expr::Literal(Literal::Bool(true)));
    assert_eq!(run(&select, LEFT, RIGHT).len(), 4);
    assert_eq!(run(&joined_select("left", &[]), &[1], &[]), vec![(Some(1), None)]);
}

#[test]
fn test_plan_operators() {
    assert_eq!(JoinKind::Inner.plan().operator(), JoinOperator::Inner);
    assert_eq!(JoinKind::Left.plan().operator(), JoinOperator::LeftOuter);
    assert_eq!(JoinKind::RightOnly.plan().operator(), JoinOperator::LeftOuter);
    assert_eq!(JoinKind::RightOnly.plan().driver, Side::Right);
    assert_eq!(JoinKind::Full.plan().operator(), JoinOperator::FullOuter);
    assert_eq!(JoinKind::NotInner.plan().filter, NullFilter::Either);
}

#[test]
fn test_join_kind_names() {
    let kind: JoinKind = serde_json::from_value(serde_json::json!("notInner"))
        .expect("notInner should be a join kind");
    assert_eq!(kind, JoinKind::NotInner);
    let kind: JoinKind = serde_json::from_value(serde_json::json!("leftOnly"))
        .expect("leftOnly should be a join kind");
    assert_eq!(kind, JoinKind::LeftOnly);
    assert!(serde_json::from_value::<JoinKind>(serde_json::json!("cross")).is_err());
}

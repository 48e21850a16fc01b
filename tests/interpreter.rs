//! End-to-end scenarios exercising the interpreter through the public IR
//! and `Interpreter` API, without any front end: every program below is
//! hand-built the way a lowering pass would emit it.

use ramlattice::config::Config;
use ramlattice::context::Context;
use ramlattice::eval;
use ramlattice::interpreter::Interpreter;
use ramlattice::ir::{
    AggregateFunction, Condition, ConstraintOp, IntrinsicOp, Operation, Pattern, RelationRef,
    RelationSchema, Statement, Value,
};
use ramlattice::lattice::{Case, LatticeAssociation, LatticeFunction};
use ramlattice::program::Program;
use ramlattice::relation::Relation;

fn schema(name: &str, arity: usize) -> RelationSchema {
    RelationSchema {
        relation: RelationRef::new(name),
        arity,
        symbol_mask: vec![false; arity],
        is_equivalence: false,
    }
}

fn fact(relation: &str, values: Vec<i32>) -> Statement {
    Statement::Fact {
        relation: RelationRef::new(relation),
        values: values.into_iter().map(Value::Number).collect(),
    }
}

fn run(interp: &Interpreter, stmt: &Statement) {
    assert!(eval::statement::eval_statement(interp, stmt));
}

#[test]
fn transitive_closure() {
    let interp = Interpreter::new(Config::default(), None);

    let base_rule = Statement::Insert {
        condition: None,
        operation: Operation::Scan {
            relation: RelationRef::new("edge"),
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::Project {
                relation: RelationRef::new("tc"),
                values: vec![
                    Value::ElementAccess { depth: 0, col: 0 },
                    Value::ElementAccess { depth: 0, col: 1 },
                ],
            }),
        },
    };

    let join_rule = || Statement::Insert {
        condition: None,
        operation: Operation::Scan {
            relation: RelationRef::new("edge"),
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::IndexScan {
                relation: RelationRef::new("tc"),
                depth: 1,
                pattern: vec![Some(Value::ElementAccess { depth: 0, col: 1 }), None],
                profile_text: None,
                inner: Box::new(Operation::Project {
                    relation: RelationRef::new("tc"),
                    values: vec![
                        Value::ElementAccess { depth: 0, col: 0 },
                        Value::ElementAccess { depth: 1, col: 1 },
                    ],
                }),
            }),
        },
    };

    let program = Statement::Sequence(vec![
        Statement::Create(schema("edge", 2)),
        Statement::Create(schema("tc", 2)),
        fact("edge", vec![1, 2]),
        fact("edge", vec![2, 3]),
        fact("edge", vec![3, 4]),
        base_rule,
        join_rule(),
        join_rule(),
        join_rule(),
    ]);

    run(&interp, &program);

    let expected = [(1, 2), (2, 3), (3, 4), (1, 3), (2, 4), (1, 4)];
    interp.relations.with("tc", |tc| {
        assert_eq!(tc.size(), expected.len());
        for (a, b) in expected {
            assert!(tc.exists(&[a, b]), "missing ({a},{b})");
        }
    });
}

#[test]
fn string_match_and_length() {
    let interp = Interpreter::new(Config::default(), None);
    let s = interp.symbols.lookup("hello world");
    let pattern = interp.symbols.lookup("hel.*");
    let hello = interp.symbols.lookup("hello");
    let x = interp.symbols.lookup("x");
    let mut ctx = Context::new(0);

    let constraint = |op, lhs, rhs| Condition::Constraint(op, Box::new(Value::Number(lhs)), Box::new(Value::Number(rhs)));

    assert!(eval::condition::eval_condition(
        &interp,
        &mut ctx,
        &constraint(ConstraintOp::Match, pattern, s)
    ));
    assert!(!eval::condition::eval_condition(
        &interp,
        &mut ctx,
        &constraint(ConstraintOp::NotMatch, pattern, s)
    ));
    assert!(eval::condition::eval_condition(
        &interp,
        &mut ctx,
        &constraint(ConstraintOp::Contains, hello, s)
    ));
    assert!(!eval::condition::eval_condition(
        &interp,
        &mut ctx,
        &constraint(ConstraintOp::Contains, x, s)
    ));

    let strlen = Value::IntrinsicOperator {
        op: IntrinsicOp::Strlen,
        args: vec![Value::Number(s)],
    };
    assert_eq!(eval::value::eval_value(&interp, &mut ctx, &strlen), 11);
}

#[test]
fn aggregate_min_and_count_over_bound_prefix() {
    let interp = Interpreter::new(Config::default(), None);
    interp.relations.create("r", 2, false);
    interp.relations.with_mut("r", |r| {
        for t in [[1, 5], [1, 3], [1, 9], [2, 7]] {
            r.insert(t.to_vec());
        }
    });
    interp.relations.create("min_out", 1, false);
    interp.relations.create("count_out", 1, false);

    let aggregate = |function, relation: &str, target, pattern: Pattern, out: &str| Statement::Insert {
        condition: None,
        operation: Operation::Aggregate {
            function,
            relation: RelationRef::new(relation),
            target,
            pattern,
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::Project {
                relation: RelationRef::new(out),
                values: vec![Value::ElementAccess { depth: 0, col: 0 }],
            }),
        },
    };

    run(
        &interp,
        &aggregate(
            AggregateFunction::Min,
            "r",
            Some(Value::ElementAccess { depth: 0, col: 1 }),
            vec![Some(Value::Number(1)), None],
            "min_out",
        ),
    );
    run(
        &interp,
        &aggregate(
            AggregateFunction::Count,
            "r",
            None,
            vec![Some(Value::Number(1)), None],
            "count_out",
        ),
    );

    interp.relations.with("min_out", |r| assert!(r.exists(&[3])));
    interp.relations.with("count_out", |r| assert!(r.exists(&[3])));

    // Empty prefix: MIN returns without binding, COUNT returns 0.
    interp.relations.create("min_empty", 1, false);
    interp.relations.create("count_empty", 1, false);
    run(
        &interp,
        &aggregate(
            AggregateFunction::Min,
            "r",
            Some(Value::ElementAccess { depth: 0, col: 1 }),
            vec![Some(Value::Number(3)), None],
            "min_empty",
        ),
    );
    run(
        &interp,
        &aggregate(
            AggregateFunction::Count,
            "r",
            None,
            vec![Some(Value::Number(3)), None],
            "count_empty",
        ),
    );
    interp.relations.with("min_empty", |r| assert!(r.is_empty()));
    interp.relations.with("count_empty", |r| assert!(r.exists(&[0])));
}

fn max_lattice() -> LatticeAssociation {
    let max_fn = LatticeFunction {
        name: "lub_max".to_string(),
        cases: vec![Case {
            when: None,
            output: Value::IntrinsicOperator {
                op: IntrinsicOp::Max,
                args: vec![Value::Argument(0), Value::Argument(1)],
            },
        }],
    };
    LatticeAssociation {
        bottom: i32::MIN,
        top: 100,
        lub_function: "lub_max".to_string(),
        glb_function: "lub_max".to_string(),
        unary: Default::default(),
        binary: [("lub_max".to_string(), max_fn)].into_iter().collect(),
    }
}

#[test]
fn lattice_lub_normalization() {
    let interp = Interpreter::new(Config::default(), Some(max_lattice()));
    interp.relations.create("r", 2, false);
    interp.relations.with_mut("r", |r| {
        for t in [[10, 3], [10, 7], [10, 5], [20, 2]] {
            r.insert(t.to_vec());
        }
    });
    interp.relations.create("r_norm", 2, false);

    run(
        &interp,
        &Statement::LatNorm {
            input: RelationRef::new("r"),
            output: RelationRef::new("r_norm"),
        },
    );

    interp.relations.with("r_norm", |out| {
        assert_eq!(out.size(), 2);
        assert!(out.exists(&[10, 7]));
        assert!(out.exists(&[20, 2]));
    });

    interp.relations.with_mut("r", |r| r.insert(vec![10, 100]));
    interp.relations.create("r_norm2", 2, false);
    run(
        &interp,
        &Statement::LatNorm {
            input: RelationRef::new("r"),
            output: RelationRef::new("r_norm2"),
        },
    );
    interp.relations.with("r_norm2", |out| assert!(out.exists(&[10, 100])));
}

#[test]
fn parallel_children_write_disjoint_relations() {
    let interp = Interpreter::new(Config::default(), None);
    for name in ["a", "b", "oa", "ob"] {
        interp.relations.create(name, 1, false);
    }
    interp.relations.with_mut("a", |r| r.insert(vec![1]));
    interp.relations.with_mut("b", |r| r.insert(vec![2]));

    let scan_project = |src: &str, dst: &str| Statement::Insert {
        condition: None,
        operation: Operation::Scan {
            relation: RelationRef::new(src),
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::Project {
                relation: RelationRef::new(dst),
                values: vec![Value::ElementAccess { depth: 0, col: 0 }],
            }),
        },
    };

    let program = Statement::Parallel(vec![scan_project("a", "oa"), scan_project("b", "ob")]);
    run(&interp, &program);

    interp.relations.with("oa", |r| assert!(r.exists(&[1])));
    interp.relations.with("ob", |r| assert!(r.exists(&[2])));
}

#[test]
fn auto_increment_is_unique_and_contiguous() {
    let interp = Interpreter::new(Config::default(), None);
    interp.relations.create("out", 1, false);

    let n = 20;
    let facts: Vec<Statement> = (0..n)
        .map(|_| Statement::Fact {
            relation: RelationRef::new("out"),
            values: vec![Value::AutoIncrement],
        })
        .collect();
    run(&interp, &Statement::Sequence(facts));

    let mut values: Vec<i32> = interp.relations.with("out", |r| r.iter().map(|t| t[0]).collect());
    values.sort();
    assert_eq!(values, (0..n).collect::<Vec<_>>());
}

#[test]
fn subroutine_execution_round_trips_arguments() {
    let mut program = Program::new();
    program.subroutines.insert(
        "double".to_string(),
        Statement::Insert {
            condition: None,
            operation: Operation::Return(vec![Some(Value::IntrinsicOperator {
                op: IntrinsicOp::Add,
                args: vec![Value::Argument(0), Value::Argument(0)],
            })]),
        },
    );
    let interp = Interpreter::for_program(Config::default(), &program);
    let (values, errors) = interp.execute_subroutine(&program, "double", vec![21]);
    assert_eq!(values, vec![42]);
    assert_eq!(errors, vec![false]);
}

#[test]
fn scan_frequency_is_recorded_when_profiling_is_enabled() {
    let config = Config {
        profile: Some("/tmp/ramlattice-profile.json".into()),
        ..Config::default()
    };
    let interp = Interpreter::new(config, None);
    interp.relations.create("edge", 1, false);
    interp.relations.create("out", 1, false);
    interp.relations.with_mut("edge", |r| {
        r.insert(vec![1]);
        r.insert(vec![2]);
        r.insert(vec![3]);
    });

    run(
        &interp,
        &Statement::Insert {
            condition: None,
            operation: Operation::Scan {
                relation: RelationRef::new("edge"),
                depth: 0,
                profile_text: Some("edge.scan".to_string()),
                inner: Box::new(Operation::Project {
                    relation: RelationRef::new("out"),
                    values: vec![Value::ElementAccess { depth: 0, col: 0 }],
                }),
            },
        },
    );

    let freqs = interp.profile.frequency_counts();
    assert_eq!(freqs["edge.scan"][&0], 3);
}

#[test]
fn relation_unused_import_guard() {
    // Keep `Relation` importable from the public API surface for embedders
    // that want to construct one directly (e.g. a custom reader).
    let r = Relation::new(2);
    assert_eq!(r.arity(), 2);
}

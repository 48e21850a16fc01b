//! Operation evaluator (§4.7, C7): executes a nested-loop query plan. Every
//! operation except `Project`/`Return` recurses into an inner operation
//! after binding its own context depth.

use crate::context::Context;
use crate::domain::{MAX_DOMAIN, MIN_DOMAIN, NULL};
use crate::interpreter::Interpreter;
use crate::ir::{AggregateFunction, Operation};

use super::condition::eval_condition;
use super::value::eval_value;

fn key_mask(pattern: &[Option<crate::ir::Value>]) -> Vec<usize> {
    pattern
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.is_some().then_some(i))
        .collect()
}

pub fn eval_operation(interp: &Interpreter, ctx: &mut Context, op: &Operation) {
    match op {
        Operation::Scan {
            relation,
            depth,
            profile_text,
            inner,
        } => {
            let tuples = interp.relations.with(relation.name(), |r| r.iter().collect::<Vec<_>>());
            for tuple in tuples {
                ctx.bind_owned(*depth, tuple);
                eval_operation(interp, ctx, inner);
                record_frequency(interp, profile_text);
            }
            ctx.unbind(*depth);
        }
        Operation::IndexScan {
            relation,
            depth,
            pattern,
            profile_text,
            inner,
        } => {
            let evaluated: Vec<Option<i32>> = pattern
                .iter()
                .map(|slot| slot.as_ref().map(|v| eval_value(interp, ctx, v)))
                .collect();
            let key = key_mask(pattern);
            let tuples = interp.relations.with_mut(relation.name(), |r| {
                r.get_index(&key);
                r.range(&key, &evaluated)
            });
            for tuple in tuples {
                ctx.bind_owned(*depth, tuple);
                eval_operation(interp, ctx, inner);
                record_frequency(interp, profile_text);
            }
            ctx.unbind(*depth);
        }
        Operation::Lookup {
            depth,
            source_depth,
            source_col,
            arity,
            profile_text,
            inner,
        } => {
            let handle = ctx.element(*source_depth, *source_col);
            if handle == NULL {
                return;
            }
            let tuple = interp.records.unpack(handle, *arity);
            ctx.bind_owned(*depth, tuple);
            eval_operation(interp, ctx, inner);
            record_frequency(interp, profile_text);
            ctx.unbind(*depth);
        }
        Operation::Aggregate {
            function,
            relation,
            target,
            pattern,
            depth,
            profile_text,
            inner,
        } => eval_aggregate(
            interp,
            ctx,
            *function,
            relation.name(),
            target.as_ref(),
            pattern,
            *depth,
            profile_text,
            inner,
        ),
        Operation::Filter {
            condition,
            profile_text,
            inner,
        } => {
            if eval_condition(interp, ctx, condition) {
                eval_operation(interp, ctx, inner);
            }
            record_frequency(interp, profile_text);
        }
        Operation::Project { relation, values } => {
            let tuple: Vec<i32> = values.iter().map(|v| eval_value(interp, ctx, v)).collect();
            interp.relations.with_mut(relation.name(), |r| r.insert(tuple));
        }
        Operation::Return(values) => {
            for slot in values {
                match slot {
                    None => ctx.push_return(0, true),
                    Some(v) => {
                        let value = eval_value(interp, ctx, v);
                        ctx.push_return(value, false);
                    }
                }
            }
        }
    }
}

/// Bumps the frequency counter for a profile-text-labeled search/filter node
/// at the interpreter's current fixed-point iteration (§6 "quantity events
/// for relation sizes and frequencies"; grounded on `Interpreter::frequencies`
/// / `visitSearch`'s per-binding counter).
fn record_frequency(interp: &Interpreter, profile_text: &Option<String>) {
    if let Some(text) = profile_text {
        interp.profile.record_frequency(text, interp.current_iteration());
    }
}

fn eval_aggregate(
    interp: &Interpreter,
    ctx: &mut Context,
    function: AggregateFunction,
    relation: &str,
    target: Option<&crate::ir::Value>,
    pattern: &[Option<crate::ir::Value>],
    depth: usize,
    profile_text: &Option<String>,
    inner: &Operation,
) {
    let evaluated: Vec<Option<i32>> = pattern
        .iter()
        .map(|slot| slot.as_ref().map(|v| eval_value(interp, ctx, v)))
        .collect();
    let key = key_mask(pattern);
    let tuples = interp.relations.with_mut(relation, |r| {
        r.get_index(&key);
        r.range(&key, &evaluated)
    });

    if tuples.is_empty() && function != AggregateFunction::Count {
        return;
    }

    let mut acc = match function {
        AggregateFunction::Min => MAX_DOMAIN,
        AggregateFunction::Max => MIN_DOMAIN,
        AggregateFunction::Sum | AggregateFunction::Count => 0,
    };

    for tuple in tuples {
        ctx.bind_owned(depth, tuple);
        match function {
            AggregateFunction::Count => acc += 1,
            _ => {
                let value = eval_value(
                    interp,
                    ctx,
                    target.expect("MIN/MAX/SUM aggregates require a target expression"),
                );
                acc = match function {
                    AggregateFunction::Min => acc.min(value),
                    AggregateFunction::Max => acc.max(value),
                    AggregateFunction::Sum => acc.wrapping_add(value),
                    AggregateFunction::Count => unreachable!(),
                };
            }
        }
    }

    ctx.bind_owned(depth, vec![acc]);
    eval_operation(interp, ctx, inner);
    record_frequency(interp, profile_text);
    ctx.unbind(depth);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::{RelationRef, Value};

    fn interp() -> Interpreter {
        Interpreter::new(Config::default(), None)
    }

    #[test]
    fn aggregate_min_over_bound_prefix() {
        let interp = interp();
        interp.relations.create("r", 2, false);
        interp.relations.with_mut("r", |r| {
            for t in [[1, 5], [1, 3], [1, 9], [2, 7]] {
                r.insert(t.to_vec());
            }
        });
        interp.relations.create("out", 1, false);
        let mut ctx = Context::new(1);
        let op = Operation::Aggregate {
            function: AggregateFunction::Min,
            relation: RelationRef::new("r"),
            target: Some(Value::ElementAccess { depth: 0, col: 1 }),
            pattern: vec![Some(Value::Number(1)), None],
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::Project {
                relation: RelationRef::new("out"),
                values: vec![Value::ElementAccess { depth: 0, col: 0 }],
            }),
        };
        eval_operation(&interp, &mut ctx, &op);
        assert!(interp.relations.with("out", |r| r.exists(&[3])));
    }

    #[test]
    fn aggregate_count_on_empty_prefix_is_zero() {
        let interp = interp();
        interp.relations.create("r", 2, false);
        interp.relations.with_mut("r", |r| r.insert(vec![1, 5]));
        interp.relations.create("out", 1, false);
        let mut ctx = Context::new(1);
        let op = Operation::Aggregate {
            function: AggregateFunction::Count,
            relation: RelationRef::new("r"),
            target: None,
            pattern: vec![Some(Value::Number(3)), None],
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::Project {
                relation: RelationRef::new("out"),
                values: vec![Value::ElementAccess { depth: 0, col: 0 }],
            }),
        };
        eval_operation(&interp, &mut ctx, &op);
        assert!(interp.relations.with("out", |r| r.exists(&[0])));
    }

    #[test]
    fn aggregate_min_on_empty_prefix_does_not_bind() {
        let interp = interp();
        interp.relations.create("r", 2, false);
        interp.relations.with_mut("r", |r| r.insert(vec![1, 5]));
        interp.relations.create("out", 1, false);
        let mut ctx = Context::new(1);
        let op = Operation::Aggregate {
            function: AggregateFunction::Min,
            relation: RelationRef::new("r"),
            target: Some(Value::ElementAccess { depth: 0, col: 1 }),
            pattern: vec![Some(Value::Number(3)), None],
            depth: 0,
            profile_text: None,
            inner: Box::new(Operation::Project {
                relation: RelationRef::new("out"),
                values: vec![Value::ElementAccess { depth: 0, col: 0 }],
            }),
        };
        eval_operation(&interp, &mut ctx, &op);
        assert!(interp.relations.with("out", |r| r.is_empty()));
    }
}

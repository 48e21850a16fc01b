//! Condition evaluator (§4.6, C6): a pure boolean function of node ×
//! context, except for the relation-store reads `EmptinessCheck` and the
//! `*ExistenceCheck` variants perform.

use regex::Regex;

use crate::context::Context;
use crate::domain::RamDomain;
use crate::interpreter::Interpreter;
use crate::ir::{Condition, ConstraintOp, Pattern};

use super::value::eval_value;

pub fn eval_condition(interp: &Interpreter, ctx: &mut Context, condition: &Condition) -> bool {
    match condition {
        Condition::Conjunction(lhs, rhs) => {
            eval_condition(interp, ctx, lhs) && eval_condition(interp, ctx, rhs)
        }
        Condition::Negation(inner) => !eval_condition(interp, ctx, inner),
        Condition::EmptinessCheck(relation) => {
            interp.relations.with(relation.name(), |r| r.is_empty())
        }
        Condition::ExistenceCheck(relation, pattern) => {
            existence_check(interp, ctx, relation.name(), pattern, false)
        }
        Condition::ProvenanceExistenceCheck(relation, pattern) => {
            existence_check(interp, ctx, relation.name(), pattern, true)
        }
        Condition::Constraint(op, lhs, rhs) => eval_constraint(interp, ctx, *op, lhs, rhs),
    }
}

fn eval_pattern(interp: &Interpreter, ctx: &mut Context, pattern: &Pattern) -> Vec<Option<RamDomain>> {
    pattern
        .iter()
        .map(|slot| slot.as_ref().map(|v| eval_value(interp, ctx, v)))
        .collect()
}

fn existence_check(
    interp: &Interpreter,
    ctx: &mut Context,
    relation: &str,
    pattern: &Pattern,
    provenance: bool,
) -> bool {
    let mut evaluated = eval_pattern(interp, ctx, pattern);
    if provenance {
        let len = evaluated.len();
        if len >= 2 {
            evaluated[len - 1] = None;
            evaluated[len - 2] = None;
        }
    }

    interp.profile.record_read(relation);

    let key: Vec<usize> = evaluated
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.is_some().then_some(i))
        .collect();

    if key.len() == evaluated.len() {
        let tuple: Vec<RamDomain> = evaluated.into_iter().map(|v| v.unwrap()).collect();
        return interp.relations.with(relation, |r| r.exists(&tuple));
    }

    interp.relations.with_mut(relation, |r| {
        r.get_index(&key);
        !r.range(&key, &evaluated).is_empty()
    })
}

fn eval_constraint(
    interp: &Interpreter,
    ctx: &mut Context,
    op: ConstraintOp,
    lhs: &crate::ir::Value,
    rhs: &crate::ir::Value,
) -> bool {
    let l = eval_value(interp, ctx, lhs);
    let r = eval_value(interp, ctx, rhs);
    match op {
        ConstraintOp::Eq => l == r,
        ConstraintOp::Ne => l != r,
        ConstraintOp::Lt => l < r,
        ConstraintOp::Le => l <= r,
        ConstraintOp::Gt => l > r,
        ConstraintOp::Ge => l >= r,
        ConstraintOp::Match => regex_match(interp, l, r),
        ConstraintOp::NotMatch => !regex_match(interp, l, r),
        ConstraintOp::Contains => interp.symbols.resolve(r).contains(&interp.symbols.resolve(l)),
        ConstraintOp::NotContains => !interp.symbols.resolve(r).contains(&interp.symbols.resolve(l)),
    }
}

/// Compiles `lhs` as a regular expression and tests it against `rhs`'s text.
/// A compile failure is a warning, not a fatal error: the constraint simply
/// evaluates to false (§7.4).
fn regex_match(interp: &Interpreter, lhs: RamDomain, rhs: RamDomain) -> bool {
    let pattern = interp.symbols.resolve(lhs);
    let text = interp.symbols.resolve(rhs);
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(&text),
        Err(e) => {
            log::warn!("invalid regex {pattern:?}: {e}");
            false
        }
    }
}

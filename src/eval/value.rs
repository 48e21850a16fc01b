//! Value evaluator (§4.5, C5): a pure function of node × context → integer,
//! except for the `AutoIncrement`/FFI/lattice cases which read interpreter
//! state.

use crate::context::Context;
use crate::domain::RamDomain;
use crate::error::DomainError;
use crate::interpreter::Interpreter;
use crate::ir::{IntrinsicOp, Value};

pub fn eval_value(interp: &Interpreter, ctx: &mut Context, value: &Value) -> RamDomain {
    match value {
        Value::Number(n) => *n,
        Value::ElementAccess { depth, col } => ctx.element(*depth, *col),
        Value::AutoIncrement => interp.next_auto_increment(),
        Value::IntrinsicOperator { op, args } => eval_intrinsic(interp, ctx, *op, args),
        Value::UserDefinedOperator {
            name,
            signature,
            args,
        } => {
            let evaluated: Vec<RamDomain> = args.iter().map(|a| eval_value(interp, ctx, a)).collect();
            interp.ffi.call(&interp.symbols, name, signature, &evaluated)
        }
        Value::QuestionMark {
            condition,
            then,
            otherwise,
        } => {
            if super::condition::eval_condition(interp, ctx, condition) {
                eval_value(interp, ctx, then)
            } else {
                eval_value(interp, ctx, otherwise)
            }
        }
        Value::Pack(args) => {
            let tuple: Vec<RamDomain> = args.iter().map(|a| eval_value(interp, ctx, a)).collect();
            interp.records.pack(tuple)
        }
        Value::Argument(i) => ctx.argument(*i),
        Value::LatticeGLB(refs) => {
            let assoc = interp
                .lattice
                .as_ref()
                .expect("LatticeGLB requires a declared lattice association");
            let mut values = refs.iter().map(|r| eval_value(interp, ctx, r));
            let first = values.next().expect("LatticeGLB requires at least one argument");
            values.fold(first, |acc, v| assoc.glb(interp, acc, v))
        }
        Value::LatticeUnaryFunctor { func, arg } => {
            let assoc = interp
                .lattice
                .as_ref()
                .expect("LatticeUnaryFunctor requires a declared lattice association");
            let arg = eval_value(interp, ctx, arg);
            assoc.apply_unary(interp, func, arg)
        }
        Value::LatticeBinaryFunctor { func, lhs, rhs } => {
            let assoc = interp
                .lattice
                .as_ref()
                .expect("LatticeBinaryFunctor requires a declared lattice association");
            let lhs = eval_value(interp, ctx, lhs);
            let rhs = eval_value(interp, ctx, rhs);
            assoc.apply_binary(interp, func, lhs, rhs)
        }
    }
}

fn eval_intrinsic(interp: &Interpreter, ctx: &mut Context, op: IntrinsicOp, args: &[Value]) -> RamDomain {
    use IntrinsicOp::*;

    if op.arity() == 1 {
        let a = eval_value(interp, ctx, &args[0]);
        return match op {
            Ord => a,
            Strlen => interp.symbols.resolve(a).chars().count() as RamDomain,
            Neg => a.wrapping_neg(),
            Bnot => !a,
            Lnot => (a == 0) as RamDomain,
            ToNumber => {
                let text = interp.symbols.resolve(a);
                text.trim()
                    .parse::<RamDomain>()
                    .unwrap_or_else(|_| DomainError::NotANumber(text).raise())
            }
            ToString => {
                let text = a.to_string();
                interp.symbols.lookup(&text)
            }
            _ => unreachable!("unary intrinsic {op:?}"),
        };
    }

    if op.arity() == 2 {
        let a = eval_value(interp, ctx, &args[0]);
        let b = eval_value(interp, ctx, &args[1]);
        return match op {
            Add => a.wrapping_add(b),
            Sub => a.wrapping_sub(b),
            Mul => a.wrapping_mul(b),
            Div => {
                if b == 0 {
                    DomainError::DivisionByZero.raise();
                }
                a.wrapping_div(b)
            }
            Exp => a.wrapping_pow(b.max(0) as u32),
            Mod => {
                if b == 0 {
                    DomainError::DivisionByZero.raise();
                }
                a.wrapping_rem(b)
            }
            Band => a & b,
            Bor => a | b,
            Bxor => a ^ b,
            Land => ((a != 0) && (b != 0)) as RamDomain,
            Lor => ((a != 0) || (b != 0)) as RamDomain,
            Max => a.max(b),
            Min => a.min(b),
            Cat => {
                let joined = format!("{}{}", interp.symbols.resolve(a), interp.symbols.resolve(b));
                interp.symbols.lookup(&joined)
            }
            _ => unreachable!("binary intrinsic {op:?}"),
        };
    }

    // Substr(str, idx, len): arity 3.
    let str_handle = eval_value(interp, ctx, &args[0]);
    let idx = eval_value(interp, ctx, &args[1]);
    let len = eval_value(interp, ctx, &args[2]);
    let text = interp.symbols.resolve(str_handle);
    let chars: Vec<char> = text.chars().collect();
    let start = idx.max(0) as usize;
    if start >= chars.len() {
        log::warn!("substr: start index {idx} out of range for {text:?}");
        return interp.symbols.lookup("");
    }
    let end = (start + len.max(0) as usize).min(chars.len());
    let slice: String = chars[start..end].iter().collect();
    interp.symbols.lookup(&slice)
}

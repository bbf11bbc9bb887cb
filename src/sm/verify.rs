use crate::sm::insn::SmInsn;
use std::collections::{HashMap, HashSet};

/// Structural well-formedness of an SM program: every jump and call target
/// exists, call arities agree with the callee's `BEGIN`, and every function
/// is bracketed as `LABEL f; BEGIN f …; …; END`.
pub fn verify(prog: &[SmInsn]) -> Result<(), String> {
    let labels: HashSet<&str> = prog
        .iter()
        .filter_map(|insn| match insn {
            SmInsn::Label(l) => Some(l.as_str()),
            _ => None,
        })
        .collect();
    let begins: HashMap<&str, usize> = prog
        .iter()
        .filter_map(|insn| match insn {
            SmInsn::Begin(name, nargs, _) => Some((name.as_str(), *nargs)),
            _ => None,
        })
        .collect();

    for insn in prog {
        match insn {
            SmInsn::Jmp(l) | SmInsn::CJmp(_, l) => {
                if !labels.contains(l.as_str()) {
                    return Err(format!("jump to undefined label {l}"));
                }
            }
            SmInsn::Call(f, n) => {
                if f.starts_with('$') {
                    continue;
                }
                if !labels.contains(f.as_str()) {
                    return Err(format!("call to undefined function {f}"));
                }
                match begins.get(f.as_str()) {
                    Some(nargs) if nargs == n => (),
                    Some(nargs) => {
                        return Err(format!("call to {f} passes {n} args, expected {nargs}"))
                    }
                    None => return Err(format!("call target {f} has no BEGIN")),
                }
            }
            _ => (),
        }
    }

    let mut current: Option<&str> = None;
    let mut pending_label: Option<&str> = None;
    for insn in prog {
        match insn {
            SmInsn::Label(l) if current.is_none() => pending_label = Some(l.as_str()),
            SmInsn::Begin(name, _, _) => {
                if current.is_some() {
                    return Err(format!("BEGIN {name} inside another function"));
                }
                if pending_label != Some(name.as_str()) {
                    return Err(format!("BEGIN {name} is not preceded by LABEL {name}"));
                }
                current = Some(name.as_str());
                pending_label = None;
            }
            SmInsn::End => {
                if current.is_none() {
                    return Err("END outside of a function".to_owned());
                }
                current = None;
            }
            _ => {
                if current.is_none() {
                    return Err(format!("instruction {insn} outside of a function"));
                }
            }
        }
    }
    if let Some(f) = current {
        return Err(format!("function {f} has no END"));
    }

    Ok(())
}

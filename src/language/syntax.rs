// The textual form of a normalized graph. There is no parser here: terms
// flow one way, out of the runtime, through readback, into text.

use crate::runtime::data::u60;
use crate::runtime::{ADD, AND, DIV, EQL, GTE, GTN, LTE, LTN, MOD, MUL, NEQ, OR, SHL, SHR, SUB, XOR};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
  Var { name: String },
  Lam { name: String, body: Box<Term> },
  App { func: Box<Term>, argm: Box<Term> },
  Sup { val0: Box<Term>, val1: Box<Term> },
  Ctr { name: String, args: Vec<Box<Term>> },
  Num { numb: u64 },
  Op2 { oper: u64, val0: Box<Term>, val1: Box<Term> },
}

pub fn show_oper(oper: u64) -> &'static str {
  match oper {
    ADD => "+",
    SUB => "-",
    MUL => "*",
    DIV => "/",
    MOD => "%",
    AND => "&",
    OR => "|",
    XOR => "^",
    SHL => "<<",
    SHR => ">>",
    LTN => "<",
    LTE => "<=",
    EQL => "==",
    GTE => ">=",
    GTN => ">",
    NEQ => "!=",
    _ => "?",
  }
}

impl std::fmt::Display for Term {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Var { name } => write!(f, "{}", name),
      Self::Lam { name, body } => write!(f, "λ{}.{}", name, body),
      Self::App { func, argm } => {
        // uncurry chains of applications
        let mut args = vec![argm];
        let mut expr = func;
        while let Self::App { func, argm } = &**expr {
          args.push(argm);
          expr = func;
        }
        args.reverse();
        write!(
          f,
          "({} {})",
          expr,
          args.iter().map(|x| format!("{}", x)).collect::<Vec<String>>().join(" ")
        )
      }
      Self::Sup { val0, val1 } => write!(f, "{{{} {}}}", val0, val1),
      Self::Ctr { name, args } => {
        write!(f, "({}{})", name, args.iter().map(|x| format!(" {}", x)).collect::<String>())
      }
      Self::Num { numb } => write!(f, "{}", u60::show(*numb)),
      Self::Op2 { oper, val0, val1 } => write!(f, "({} {} {})", val0, show_oper(*oper), val1),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_shapes() {
    let id = Term::Lam {
      name: "x0".to_string(),
      body: Box::new(Term::Var { name: "x0".to_string() }),
    };
    assert_eq!(format!("{}", id), "λx0.x0");
    let pair = Term::Ctr {
      name: "Pair".to_string(),
      args: vec![Box::new(Term::Num { numb: 1 }), Box::new(Term::Num { numb: 2 })],
    };
    assert_eq!(format!("{}", pair), "(Pair 1 2)");
    let sum = Term::Op2 {
      oper: ADD,
      val0: Box::new(Term::Num { numb: 1 }),
      val1: Box::new(Term::Num { numb: 2 }),
    };
    assert_eq!(format!("{}", sum), "(1 + 2)");
  }
}
